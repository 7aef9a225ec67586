use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use sqlite_crud::{demo, SqliteConfig, SqliteStore};

/// Create the students/subjects schema and walk through every CRUD helper.
#[derive(Parser, Debug)]
#[command(name = "sqlite-crud-demo", version, about)]
struct Cli {
    /// Database file, created if absent
    #[arg(default_value = "database.db")]
    db_path: String,

    /// JSON store config replacing the built-in schema and path; it must
    /// still define the students and subjects tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave the demo rows in place instead of deleting them at the end
    #[arg(long)]
    keep: bool,
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => SqliteConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SqliteConfig::new(cli.db_path.clone(), demo::school_schema()),
    };

    let store = SqliteStore::open(&config)
        .with_context(|| format!("failed to open {}", config.db_path))?;

    for (label, rows) in demo::run(&store, cli.keep)? {
        println!("{label}: {}", serde_json::to_string(&rows)?);
    }

    store.close().context("failed to close database")?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
