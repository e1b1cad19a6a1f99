//! Database operations for `PostgreSQL`.
//!
//! ## Tables
//!
//! - `pricing_policy` - the singleton pricing policy (fixed singleton key)
//! - `orders` - one row per order, lines and payments embedded as JSONB
//! - `products` - catalog snapshot source (owned by the catalog service)
//! - `client_profiles` - buyer display names (owned by the profile service)
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are embedded via
//! `sqlx::migrate!`; the server applies them at startup.
//!
//! Queries use the sqlx runtime API with explicit row types and `TryFrom`
//! conversions into domain types; invalid stored data surfaces as
//! [`RepositoryError::DataCorruption`] rather than a panic.

pub mod catalog;
pub mod orders;
pub mod policy;
pub mod profiles;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{CatalogRepository, Product};
pub use orders::{OrderCounts, OrderRepository};
pub use policy::{PolicyRecord, PolicyRepository};
pub use profiles::ProfileDirectory;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., second pricing policy).
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
