//! PostgreSQL implementation of [`UserDirectory`].
//!
//! Reads the host's `users` table through the narrow column set this
//! crate consumes; see [`crate::postgres::migrations::run_core`] for the
//! expected shape.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::db_error;
use crate::repository::UserDirectory;
use crate::types::UserAccount;
use crate::AccessError;

/// PostgreSQL-backed user directory.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    email: String,
    name: String,
    active_workspace_id: Option<i64>,
}

impl From<UserRecord> for UserAccount {
    fn from(row: UserRecord) -> Self {
        UserAccount {
            id: row.id,
            email: row.email,
            name: row.name,
            active_workspace_id: row.active_workspace_id,
        }
    }
}

const USER_COLUMNS: &str = "id, email, name, active_workspace_id";

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<UserAccount>, AccessError> {
        let row: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find_user_by_id", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, ids), err))]
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserAccount>, AccessError> {
        let rows: Vec<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("find_users_by_ids", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccessError> {
        let row: Option<UserRecord> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("find_user_by_email", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn set_active_workspace(
        &self,
        user_id: i64,
        workspace_id: i64,
    ) -> Result<(), AccessError> {
        sqlx::query("UPDATE users SET active_workspace_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(workspace_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("set_active_workspace", &e))?;

        Ok(())
    }
}
