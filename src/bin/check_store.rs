//! Check that the document store is reachable.
//!
//! Usage: `cargo run --bin check-store`
//!
//! Prints every non-empty collection with its document count.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studytrack::{
    config::Config,
    db::{CollectionInfo, SqlxDocumentRepository, StoreConnector},
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
        Ok(collections) => {
            println!("Store connection successful.");
            if collections.is_empty() {
                println!("Collections: (none yet)");
            }
            for collection in &collections {
                println!("  - {}: {} documents", collection.name, collection.count);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Store connection failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<Vec<CollectionInfo>> {
    let config = Config::load_with_env(Path::new("config.yml"))?;

    let connector = StoreConnector::new(config.database.clone());
    let pool = connector.initialize().await?;
    pool.ping().await?;

    let repo = SqlxDocumentRepository::boxed(pool);
    repo.collections().await
}
