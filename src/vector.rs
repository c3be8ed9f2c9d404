//! Vector type and parsing

use crate::error::{Result, ShardError};
use serde::{Deserialize, Serialize};

/// A point in n-dimensional space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    /// Create a new vector from a Vec<f32>
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimension of the vector
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get the underlying data as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Fail with `DimensionMismatch` unless this vector has `expected` components.
    pub fn check_dimension(&self, expected: usize) -> Result<()> {
        if self.dimension() != expected {
            return Err(ShardError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }

    /// Fail with `NonFiniteComponent` if any component is NaN or infinite.
    pub fn check_finite(&self) -> Result<()> {
        match self.data.iter().position(|x| !x.is_finite()) {
            Some(index) => Err(ShardError::NonFiniteComponent { index }),
            None => Ok(()),
        }
    }

    /// Dimension and finiteness checks applied to every stored point and query.
    pub fn validate(&self, expected: usize) -> Result<()> {
        self.check_dimension(expected)?;
        self.check_finite()
    }

    /// Parse a vector from a comma-separated string
    pub fn from_str(s: &str) -> Result<Self> {
        Self::from_fields(s.split(','), 1)
    }

    /// Parse components from already-split fields. `line` is only used for error reporting.
    pub(crate) fn from_fields<'a>(fields: impl Iterator<Item = &'a str>, line: usize) -> Result<Self> {
        let data: Result<Vec<f32>> = fields
            .map(|x| {
                x.trim().parse::<f32>().map_err(|_| ShardError::Parse {
                    line,
                    reason: format!("Invalid float: {:?}", x),
                })
            })
            .collect();
        Ok(Vector::new(data?))
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}
