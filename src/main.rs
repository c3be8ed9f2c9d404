//! CLI interface for a single k-NN shard

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use knn_shard::{Shard, ShardConfig, Vector};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "knn-shard")]
#[command(about = "Exact k-nearest-neighbor search over one shard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ShardArgs {
    /// Comma-delimited data file: id followed by vector components
    #[arg(long)]
    data: PathBuf,

    /// Components per vector (ignored when --config is given)
    #[arg(long)]
    dim: Option<usize>,

    /// Number of scan workers (ignored when --config is given)
    #[arg(long, default_value = "4")]
    workers: usize,

    /// JSON shard configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query against the shard
    Search {
        #[command(flatten)]
        shard: ShardArgs,
        /// Query vector as comma-separated values (e.g., "1.0,2.0,3.0")
        #[arg(long)]
        query: String,
        /// Number of results to return
        #[arg(short, long, default_value = "5")]
        k: usize,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run repeated queries sampled from the shard and report latency
    Bench {
        #[command(flatten)]
        shard: ShardArgs,
        /// Number of results per query
        #[arg(short, long, default_value = "10")]
        k: usize,
        /// Number of queries to run
        #[arg(long, default_value = "100")]
        queries: usize,
        /// Seed for query sampling
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn open_shard(args: &ShardArgs) -> Result<Shard> {
    let config = match (&args.config, args.dim) {
        (Some(path), _) => ShardConfig::from_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        (None, Some(dim)) => ShardConfig::new(args.workers, dim),
        (None, None) => anyhow::bail!("either --dim or --config is required"),
    };
    let shard = Shard::with_config(config)?;

    let started = Instant::now();
    let count = shard
        .load_from_path(&args.data)
        .with_context(|| format!("loading {}", args.data.display()))?;
    shard.freeze()?;
    eprintln!(
        "Loaded {} records ({} distinct) in {:.2?}",
        count,
        shard.len(),
        started.elapsed()
    );
    Ok(shard)
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Search {
            shard,
            query,
            k,
            json,
        } => {
            let shard = open_shard(&shard)?;
            let q = Vector::from_str(&query)?;
            let results = shard.search(&q, k)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No results found (shard is empty)");
            } else {
                println!("Top {} results:", results.len());
                for (i, result) in results.iter().enumerate() {
                    println!("{}. {} (distance: {:.4})", i + 1, result.id, result.distance);
                }
            }
        }
        Commands::Bench {
            shard,
            k,
            queries,
            seed,
        } => {
            let shard = open_shard(&shard)?;
            let mut latencies: Vec<Duration> = Vec::with_capacity(queries);
            for i in 0..queries as u64 {
                let query = shard
                    .sample_vector(seed.wrapping_add(i))?
                    .context("cannot benchmark an empty shard")?;
                let started = Instant::now();
                shard.search(&query, k)?;
                latencies.push(started.elapsed());
            }
            if latencies.is_empty() {
                println!("No queries run");
                return Ok(());
            }

            latencies.sort();
            let total: Duration = latencies.iter().sum();
            let pct = |p: f64| latencies[((p / 100.0) * (latencies.len() - 1) as f64).round() as usize];
            println!(
                "{} queries, k={}, workers={}, points={}",
                latencies.len(),
                k,
                shard.worker_count(),
                shard.len()
            );
            println!("  avg: {:.2?}", total / latencies.len() as u32);
            println!("  p50: {:.2?}", pct(50.0));
            println!("  p95: {:.2?}", pct(95.0));
            println!("  p99: {:.2?}", pct(99.0));
            println!("  qps: {:.1}", latencies.len() as f64 / total.as_secs_f64());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli.command)
}
