//! Store initialization
//!
//! A process opens the document store once through [`StoreConnector`] and
//! passes the returned handle to every component that needs it. Calling
//! `initialize` again hands back the same handle.

use anyhow::{Context, Result};
use tokio::sync::OnceCell;

use super::{create_pool, migrations, DynDatabasePool};
use crate::config::DatabaseConfig;

/// One-shot store initializer
pub struct StoreConnector {
    config: DatabaseConfig,
    pool: OnceCell<DynDatabasePool>,
}

impl StoreConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    /// Open the store and apply migrations, or return the already open handle
    pub async fn initialize(&self) -> Result<DynDatabasePool> {
        if let Some(pool) = self.pool.get() {
            tracing::debug!("Document store already initialized");
            return Ok(pool.clone());
        }

        let pool = self
            .pool
            .get_or_try_init(|| async {
                tracing::info!(
                    "Connecting to {:?} document store at {}",
                    self.config.driver,
                    self.config.url
                );
                let pool = create_pool(&self.config)
                    .await
                    .context("Failed to open document store")?;
                migrations::run_migrations(&pool)
                    .await
                    .context("Failed to migrate document store")?;
                Ok::<_, anyhow::Error>(pool)
            })
            .await?;

        Ok(pool.clone())
    }

    /// Check if `initialize` has completed
    pub fn is_initialized(&self) -> bool {
        self.pool.initialized()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}
