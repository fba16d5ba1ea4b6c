//! PostgreSQL implementation of [`WorkspaceRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{db_error, is_unique_violation};
use crate::repository::{CreateWorkspace, WorkspaceRepository};
use crate::roles::Role;
use crate::types::Workspace;
use crate::AccessError;

/// PostgreSQL-backed workspace store.
#[derive(Clone)]
pub struct PostgresWorkspaceStore {
    pool: PgPool,
}

impl PostgresWorkspaceStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct WorkspaceRecord {
    id: i64,
    name: String,
    slug: String,
    owner_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WorkspaceRecord> for Workspace {
    fn from(row: WorkspaceRecord) -> Self {
        Workspace {
            id: row.id,
            name: row.name,
            slug: row.slug,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const WORKSPACE_COLUMNS: &str = "id, name, slug, owner_id, created_at, updated_at";

#[async_trait]
impl WorkspaceRepository for PostgresWorkspaceStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateWorkspace) -> Result<Workspace, AccessError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("create_workspace", &e))?;

        let row: WorkspaceRecord = sqlx::query_as(
            r"
            INSERT INTO workspaces (name, slug, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, owner_id, created_at, updated_at
            ",
        )
        .bind(&data.name)
        .bind(&data.slug)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "workspaces_slug_key") {
                AccessError::SlugTaken
            } else {
                db_error("create_workspace", &e)
            }
        })?;

        sqlx::query(
            r"
            INSERT INTO workspace_memberships (workspace_id, user_id, role)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(row.id)
        .bind(data.owner_id)
        .bind(Role::Owner.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("create_owner_membership", &e))?;

        sqlx::query("UPDATE users SET active_workspace_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(row.id)
            .bind(data.owner_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("set_owner_active_workspace", &e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("create_workspace", &e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Workspace>, AccessError> {
        let row: Option<WorkspaceRecord> = sqlx::query_as(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_workspace_by_id", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, ids), err))]
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Workspace>, AccessError> {
        let rows: Vec<WorkspaceRecord> = sqlx::query_as(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_workspaces_by_ids", &e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Workspace>, AccessError> {
        let row: Option<WorkspaceRecord> = sqlx::query_as(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_workspace_by_slug", &e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>, AccessError> {
        // base is already slugified: lowercase alphanumerics and hyphens,
        // so it cannot carry LIKE wildcards
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT slug FROM workspaces WHERE slug = $1 OR slug LIKE $2")
                .bind(base)
                .bind(format!("{base}-%"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("slugs_with_prefix", &e))?;

        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, name), err))]
    async fn rename(&self, id: i64, name: &str) -> Result<Workspace, AccessError> {
        let row: WorkspaceRecord = sqlx::query_as(
            r"
            UPDATE workspaces SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, name, slug, owner_id, created_at, updated_at
            ",
        )
        .bind(name)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AccessError::NotFound,
            _ => db_error("rename_workspace", &e),
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: i64) -> Result<(), AccessError> {
        // memberships and invites cascade via foreign keys; stale
        // active-workspace pointers null out the same way
        sqlx::query("DELETE FROM workspaces WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_workspace", &e))?;

        Ok(())
    }
}
