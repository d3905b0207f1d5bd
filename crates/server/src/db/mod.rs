//! Database operations for the restock alerts `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `lead` - Customer restock subscription requests, one row per request
//! - `shop` - Shopify OAuth credentials, one row per installed store
//!
//! All queries are scoped by shop domain; one store's leads are never
//! visible to another store's webhook or dashboard traffic.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are applied on
//! startup via `sqlx::migrate!`.

pub mod leads;
pub mod shops;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use leads::{Lead, LeadRepository, NewLead};
pub use shops::{ShopCredentials, ShopRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate pending lead).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
