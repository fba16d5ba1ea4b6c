//! PostgreSQL implementation of [`InviteRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::membership::MembershipRecord;
use super::{db_error, is_unique_violation, parse_role};
use crate::repository::{CreateInvite, InviteRepository};
use crate::types::{Membership, WorkspaceInvite};
use crate::AccessError;

/// PostgreSQL-backed invite store.
#[derive(Clone)]
pub struct PostgresInviteStore {
    pool: PgPool,
}

impl PostgresInviteStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct InviteRecord {
    id: i64,
    workspace_id: i64,
    email: String,
    role: String,
    token_hash: String,
    invited_by: i64,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl InviteRecord {
    fn into_invite(self) -> Result<WorkspaceInvite, AccessError> {
        Ok(WorkspaceInvite {
            id: self.id,
            workspace_id: self.workspace_id,
            email: self.email,
            role: parse_role(&self.role)?,
            token_hash: self.token_hash,
            invited_by: self.invited_by,
            expires_at: self.expires_at,
            accepted_at: self.accepted_at,
            created_at: self.created_at,
        })
    }
}

const INVITE_COLUMNS: &str =
    "id, workspace_id, email, role, token_hash, invited_by, expires_at, accepted_at, created_at";

#[async_trait]
impl InviteRepository for PostgresInviteStore {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateInvite) -> Result<WorkspaceInvite, AccessError> {
        let row: InviteRecord = sqlx::query_as(
            r"
            INSERT INTO workspace_invites (workspace_id, email, role, token_hash, invited_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, workspace_id, email, role, token_hash, invited_by, expires_at, accepted_at, created_at
            ",
        )
        .bind(data.workspace_id)
        .bind(&data.email)
        .bind(data.role.as_str())
        .bind(&data.token_hash)
        .bind(data.invited_by)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("create_invite", &e))?;

        row.into_invite()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<WorkspaceInvite>, AccessError> {
        let row: Option<InviteRecord> = sqlx::query_as(&format!(
            "SELECT {INVITE_COLUMNS} FROM workspace_invites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_invite_by_id", &e))?;

        row.map(InviteRecord::into_invite).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<WorkspaceInvite>, AccessError> {
        let row: Option<InviteRecord> = sqlx::query_as(&format!(
            "SELECT {INVITE_COLUMNS} FROM workspace_invites WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_invite_by_token_hash", &e))?;

        row.map(InviteRecord::into_invite).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_pending_by_workspace(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<WorkspaceInvite>, AccessError> {
        let rows: Vec<InviteRecord> = sqlx::query_as(&format!(
            r"
            SELECT {INVITE_COLUMNS} FROM workspace_invites
            WHERE workspace_id = $1 AND accepted_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC
            "
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_pending_invites", &e))?;

        rows.into_iter().map(InviteRecord::into_invite).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn has_pending(&self, workspace_id: i64, email: &str) -> Result<bool, AccessError> {
        let exists: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS(
                SELECT 1 FROM workspace_invites
                WHERE workspace_id = $1 AND email = $2
                  AND accepted_at IS NULL AND expires_at > NOW()
            )
            ",
        )
        .bind(workspace_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("has_pending_invite", &e))?;

        Ok(exists)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn accept(
        &self,
        invite_id: i64,
        user_id: i64,
    ) -> Result<(WorkspaceInvite, Membership), AccessError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("accept_invite", &e))?;

        // conditional claim: the WHERE clause is the single-use check,
        // re-run at the transactional boundary
        let claimed: Option<InviteRecord> = sqlx::query_as(
            r"
            UPDATE workspace_invites SET accepted_at = NOW()
            WHERE id = $1 AND accepted_at IS NULL
            RETURNING id, workspace_id, email, role, token_hash, invited_by, expires_at, accepted_at, created_at
            ",
        )
        .bind(invite_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("claim_invite", &e))?;

        let Some(claimed) = claimed else {
            // lost the claim race, or the invite is gone entirely
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM workspace_invites WHERE id = $1)")
                    .bind(invite_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| db_error("accept_invite", &e))?;
            return Err(if exists {
                AccessError::InviteAlreadyAccepted
            } else {
                AccessError::NotFound
            });
        };

        let membership: MembershipRecord = sqlx::query_as(
            r"
            INSERT INTO workspace_memberships (workspace_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, workspace_id, user_id, role, created_at, updated_at
            ",
        )
        .bind(claimed.workspace_id)
        .bind(user_id)
        .bind(&claimed.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // rolls the claim back with the dropped transaction
            if is_unique_violation(&e, "workspace_memberships_workspace_id_user_id_key") {
                AccessError::AlreadyMember
            } else {
                db_error("accept_invite_membership", &e)
            }
        })?;

        sqlx::query("UPDATE users SET active_workspace_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(claimed.workspace_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("accept_invite_active_workspace", &e))?;

        tx.commit().await.map_err(|e| db_error("accept_invite", &e))?;

        Ok((claimed.into_invite()?, membership.into_membership()?))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, id: i64) -> Result<(), AccessError> {
        sqlx::query("DELETE FROM workspace_invites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete_invite", &e))?;

        Ok(())
    }
}
