//! studytrack - learning-tracker backend

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studytrack::{
    api::{self, AppState},
    config::Config,
    db::{SqlxDocumentRepository, StoreConnector},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studytrack=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting studytrack...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Open the document store once for the whole process
    let connector = StoreConnector::new(config.database.clone());
    let pool = connector.initialize().await?;
    tracing::info!("Document store ready: {:?}", config.database.driver);

    let repo = SqlxDocumentRepository::boxed(pool.clone());
    let state = AppState::new(pool, repo);

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
