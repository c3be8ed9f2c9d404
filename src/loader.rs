//! Comma-delimited point ingestion.
//!
//! Each non-blank line is `id,c0,c1,...`: the identifier followed by exactly
//! `dimension` float components.

use crate::error::{Result, ShardError};
use crate::vector::Vector;
use std::io::BufRead;

/// Parse one line into an `(id, vector)` pair. `line_no` is 1-based.
pub fn parse_line(line: &str, dimension: usize, line_no: usize) -> Result<(String, Vector)> {
    let mut fields = line.split(',');
    let id = fields.next().map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(ShardError::Parse {
            line: line_no,
            reason: "missing identifier".to_string(),
        });
    }

    let vector = Vector::from_fields(fields, line_no)?;
    if vector.dimension() != dimension {
        return Err(ShardError::Parse {
            line: line_no,
            reason: format!(
                "expected {} components, got {}",
                dimension,
                vector.dimension()
            ),
        });
    }
    if let Err(e) = vector.check_finite() {
        return Err(ShardError::Parse {
            line: line_no,
            reason: e.to_string(),
        });
    }
    Ok((id.to_string(), vector))
}

/// Lazily decode points from a reader, skipping blank lines.
pub fn read_points<R: BufRead>(
    reader: R,
    dimension: usize,
) -> impl Iterator<Item = Result<(String, Vector)>> {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(i, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_line(&line, dimension, i + 1)),
            Err(e) => Some(Err(e.into())),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_line() {
        let (id, v) = parse_line("doc-7, 0.5,1.5 ,-2", 3, 1).unwrap();
        assert_eq!(id, "doc-7");
        assert_eq!(v.as_slice(), &[0.5, 1.5, -2.0]);
    }

    #[test]
    fn test_parse_line_wrong_width() {
        assert!(matches!(
            parse_line("a,1,2", 3, 4),
            Err(ShardError::Parse { line: 4, .. })
        ));
        assert!(matches!(
            parse_line("a,1,2,3,4", 3, 1),
            Err(ShardError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_line_non_finite() {
        for line in ["a,NaN,0", "a,0,-nan", "a,inf,0", "a,0,-infinity"] {
            assert!(matches!(
                parse_line(line, 2, 3),
                Err(ShardError::Parse { line: 3, .. })
            ));
        }
    }

    #[test]
    fn test_parse_line_missing_id() {
        assert!(matches!(
            parse_line(",1,2", 2, 9),
            Err(ShardError::Parse { line: 9, .. })
        ));
    }

    #[test]
    fn test_read_points_skips_blank_lines() {
        let input = "a,0,0\n\nb,1,0\n  \nc,0,5\n";
        let points: Vec<_> = read_points(Cursor::new(input), 2)
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let ids: Vec<&str> = points.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_read_points_reports_line_number() {
        let input = "a,0,0\nb,x,0\n";
        let err = read_points(Cursor::new(input), 2)
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        assert!(matches!(err, ShardError::Parse { line: 2, .. }));
    }
}
