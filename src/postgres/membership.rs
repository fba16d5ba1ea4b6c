//! PostgreSQL implementation of [`MembershipRepository`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{db_error, is_unique_violation, parse_role};
use crate::repository::{CreateMembership, MembershipRepository};
use crate::roles::Role;
use crate::types::Membership;
use crate::AccessError;

/// PostgreSQL-backed membership store.
#[derive(Clone)]
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
pub(crate) struct MembershipRecord {
    pub(crate) id: i64,
    pub(crate) workspace_id: i64,
    pub(crate) user_id: i64,
    pub(crate) role: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl MembershipRecord {
    pub(crate) fn into_membership(self) -> Result<Membership, AccessError> {
        Ok(Membership {
            id: self.id,
            workspace_id: self.workspace_id,
            user_id: self.user_id,
            role: parse_role(&self.role)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const MEMBERSHIP_COLUMNS: &str = "id, workspace_id, user_id, role, created_at, updated_at";

#[async_trait]
impl MembershipRepository for PostgresMembershipStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateMembership) -> Result<Membership, AccessError> {
        let row: MembershipRecord = sqlx::query_as(
            r"
            INSERT INTO workspace_memberships (workspace_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, workspace_id, user_id, role, created_at, updated_at
            ",
        )
        .bind(data.workspace_id)
        .bind(data.user_id)
        .bind(data.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "workspace_memberships_workspace_id_user_id_key") {
                AccessError::AlreadyMember
            } else {
                db_error("create_membership", &e)
            }
        })?;

        row.into_membership()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<Option<Membership>, AccessError> {
        let row: Option<MembershipRecord> = sqlx::query_as(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM workspace_memberships WHERE workspace_id = $1 AND user_id = $2"
        ))
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_membership", &e))?;

        row.map(MembershipRecord::into_membership).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_workspace(&self, workspace_id: i64) -> Result<Vec<Membership>, AccessError> {
        let rows: Vec<MembershipRecord> = sqlx::query_as(&format!(
            r"
            SELECT {MEMBERSHIP_COLUMNS} FROM workspace_memberships
            WHERE workspace_id = $1
            ORDER BY (role = 'owner') DESC, created_at ASC
            "
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_memberships_by_workspace", &e))?;

        rows.into_iter()
            .map(MembershipRecord::into_membership)
            .collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Membership>, AccessError> {
        let rows: Vec<MembershipRecord> = sqlx::query_as(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM workspace_memberships WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_memberships_by_user", &e))?;

        rows.into_iter()
            .map(MembershipRecord::into_membership)
            .collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, workspace_ids), err))]
    async fn count_by_workspaces(
        &self,
        workspace_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AccessError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r"
            SELECT workspace_id, COUNT(*) FROM workspace_memberships
            WHERE workspace_id = ANY($1)
            GROUP BY workspace_id
            ",
        )
        .bind(workspace_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("count_memberships", &e))?;

        Ok(rows.into_iter().collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn count_with_role(&self, workspace_id: i64, role: Role) -> Result<i64, AccessError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workspace_memberships WHERE workspace_id = $1 AND role = $2",
        )
        .bind(workspace_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("count_memberships_with_role", &e))?;

        Ok(count)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_role(
        &self,
        workspace_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<Membership, AccessError> {
        let row: MembershipRecord = sqlx::query_as(
            r"
            UPDATE workspace_memberships SET role = $1, updated_at = NOW()
            WHERE workspace_id = $2 AND user_id = $3
            RETURNING id, workspace_id, user_id, role, created_at, updated_at
            ",
        )
        .bind(role.as_str())
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AccessError::NotFound,
            _ => db_error("update_membership_role", &e),
        })?;

        row.into_membership()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<(), AccessError> {
        sqlx::query("DELETE FROM workspace_memberships WHERE workspace_id = $1 AND user_id = $2")
            .bind(workspace_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_membership", &e))?;

        Ok(())
    }
}
