//! PostgreSQL-backed stores.

mod invite;
mod membership;
pub mod migrations;
mod users;
mod workspace;

pub use invite::PostgresInviteStore;
pub use membership::PostgresMembershipStore;
pub use users::PostgresUserDirectory;
pub use workspace::PostgresWorkspaceStore;

use sqlx::PgPool;

use crate::AccessError;

/// Creates all Postgres store instances from a connection pool.
pub fn create_stores(
    pool: PgPool,
) -> (
    PostgresWorkspaceStore,
    PostgresMembershipStore,
    PostgresInviteStore,
    PostgresUserDirectory,
) {
    (
        PostgresWorkspaceStore::new(pool.clone()),
        PostgresMembershipStore::new(pool.clone()),
        PostgresInviteStore::new(pool.clone()),
        PostgresUserDirectory::new(pool),
    )
}

/// True when `err` is a unique-constraint violation on `constraint`.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}

pub(crate) fn db_error(operation: &'static str, err: &sqlx::Error) -> AccessError {
    log::error!(
        target: "palisade",
        "msg=\"database error\", operation=\"{operation}\", error=\"{err}\""
    );
    AccessError::Database(err.to_string())
}

/// Parses a stored role string, surfacing corrupt rows as typed errors
/// instead of panics.
pub(crate) fn parse_role(role: &str) -> Result<crate::roles::Role, AccessError> {
    crate::roles::Role::from_str(role).ok_or_else(|| AccessError::UnknownRole(role.to_owned()))
}
