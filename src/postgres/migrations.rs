//! Database migrations.
//!
//! # Example
//!
//! ```rust,ignore
//! use orgward::postgres::migrations;
//! use sqlx::PgPool;
//!
//! async fn setup_database(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//!     migrations::run(pool).await
//! }
//! ```

use sqlx::PgPool;

/// Runs the orgward migrations.
///
/// This includes tables for:
/// - `users`
/// - `orgs`
/// - `roles`
/// - `memberships`
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
