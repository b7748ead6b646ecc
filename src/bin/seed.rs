//! Seed the topic catalog into the document store.
//!
//! Usage: `cargo run --bin seed [path/to/topics.json]`
//!
//! Without an argument the file named by `seed.path` in `config.yml` is used.
//! Exits with 1 on any fatal error, before any write when the file is missing
//! or lacks the `categories`/`topics` lists.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studytrack::{
    config::Config,
    db::{SqlxDocumentRepository, StoreConnector},
    services::{SeedCatalog, SeedLoader, SeedReport},
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studytrack=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Seeding failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<SeedReport> {
    let config = Config::load_with_env(Path::new("config.yml"))?;
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.seed.path.clone());

    // the file is checked before the store is touched
    println!("Loading catalog from {}", path.display());
    let catalog = SeedCatalog::load(&path)?;
    println!("Found {} entries", catalog.len());

    let connector = StoreConnector::new(config.database.clone());
    let pool = connector.initialize().await?;
    let repo = SqlxDocumentRepository::boxed(pool);

    let loader = SeedLoader::new(repo, config.seed.on_invalid_entry);
    let report = loader.seed(&catalog).await?;
    Ok(report)
}

fn print_summary(report: &SeedReport) {
    println!("Categories seeded: {}", report.categories);
    println!("Topics seeded: {}", report.topics);

    if report.is_complete() {
        println!("Seeding completed: {} records written", report.total());
        return;
    }

    println!(
        "Seeding completed with {} skipped entries:",
        report.skipped.len()
    );
    for entry in &report.skipped {
        println!("  - {}[{}]: {}", entry.group, entry.index, entry.error);
    }
}
