//! Catalog seeding command.
//!
//! Fetches sample products from the DummyJSON feed and replaces the stored
//! catalog with them.

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use orchard_server::db::{PgProductStore, create_pool};
use orchard_server::services::catalog::{self, CatalogError};
use orchard_server::store::ProductStore;

const DEFAULT_SOURCE: &str = "https://dummyjson.com/products";

/// Errors from catalog seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("ORCHARD_DATABASE_URL not set")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Replace the catalog with products from the sample feed.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the feed is
/// unreachable, or the replacement fails.
pub async fn run(source: Option<&str>) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ORCHARD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingDatabaseUrl)?;

    let pool = create_pool(&database_url).await?;
    info!("Connected to database");

    let products: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool));
    let source = source.unwrap_or(DEFAULT_SOURCE);

    let report = catalog::seed_catalog(products.as_ref(), source).await?;

    info!("Seeding complete!");
    info!("  Products fetched: {}", report.fetched);
    info!("  Products inserted: {}", report.inserted);

    Ok(())
}
