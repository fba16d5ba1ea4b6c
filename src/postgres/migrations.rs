//! Database migrations, split by concern.
//!
//! # Example
//!
//! ```rust,ignore
//! use palisade::postgres::migrations;
//! use sqlx::PgPool;
//!
//! async fn setup_database(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//!     migrations::run_all(pool).await
//! }
//! ```

use sqlx::PgPool;

/// Runs the minimal `users` table migration.
///
/// Hosts with their own user store skip this and instead guarantee a
/// `users` table with `id`, `email`, `name`, and a nullable
/// `active_workspace_id` column for [`crate::postgres::PostgresUserDirectory`]
/// to read.
pub async fn run_core(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/core").run(pool).await
}

/// Runs workspace migrations.
///
/// This includes tables for:
/// - `workspaces`
/// - `workspace_memberships`
/// - `workspace_invites`
pub async fn run_workspace(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/workspace").run(pool).await
}

/// Runs all migrations in dependency order.
pub async fn run_all(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    run_core(pool).await?;
    run_workspace(pool).await
}
