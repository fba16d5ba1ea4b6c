//! Storage traits for workspaces, memberships, invitations, and the
//! narrow user directory.
//!
//! Invariant-bearing compound writes — workspace creation with its owner
//! membership, and invite acceptance — are single trait methods so every
//! backend can execute them inside one atomic boundary (a SQL transaction
//! in the postgres store, one write-lock scope in the memory store).
//! Checked-then-written sequences split across calls would race under
//! request parallelism.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::roles::Role;
use crate::types::{Membership, UserAccount, Workspace, WorkspaceInvite};
use crate::AccessError;

/// Input for the atomic workspace + owner-membership creation.
#[derive(Debug, Clone)]
pub struct CreateWorkspace {
    pub name: String,
    pub slug: String,
    pub owner_id: i64,
}

/// Input for membership creation.
#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub workspace_id: i64,
    pub user_id: i64,
    pub role: Role,
}

/// Input for invitation creation.
#[derive(Debug, Clone)]
pub struct CreateInvite {
    pub workspace_id: i64,
    pub email: String,
    pub role: Role,
    pub token_hash: String,
    pub invited_by: i64,
    pub expires_at: DateTime<Utc>,
}

/// Owns workspace identity and the cascade over everything scoped to it.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Creates the workspace, its Owner membership for `data.owner_id`,
    /// and points the owner's active workspace at it — atomically.
    ///
    /// Slug uniqueness is re-validated at write time; a collision fails
    /// with [`AccessError::SlugTaken`] so the caller can retry with the
    /// next suffix candidate.
    async fn create(&self, data: CreateWorkspace) -> Result<Workspace, AccessError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Workspace>, AccessError>;

    /// Bulk fetch for list views; result order is unspecified.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Workspace>, AccessError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Workspace>, AccessError>;

    /// Existing slugs equal to `base` or starting with `base-`. Used only
    /// to seed the suffix retry loop; write-time uniqueness decides.
    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>, AccessError>;

    /// Fails with [`AccessError::NotFound`] if the workspace is gone.
    async fn rename(&self, id: i64, name: &str) -> Result<Workspace, AccessError>;

    /// Deletes the workspace, cascading memberships and invites, and
    /// clearing any active-workspace pointers that referenced it.
    async fn delete(&self, id: i64) -> Result<(), AccessError>;
}

/// Owns the (user, workspace) → role relation.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Fails with [`AccessError::AlreadyMember`] when a membership for
    /// the (user, workspace) pair already exists.
    async fn create(&self, data: CreateMembership) -> Result<Membership, AccessError>;

    async fn find_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<Option<Membership>, AccessError>;

    /// All memberships of a workspace, Owner first, then join time
    /// ascending.
    async fn find_by_workspace(&self, workspace_id: i64) -> Result<Vec<Membership>, AccessError>;

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Membership>, AccessError>;

    /// Member counts for many workspaces in one grouped query, keyed by
    /// workspace id. Workspaces with no members are simply absent.
    async fn count_by_workspaces(
        &self,
        workspace_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AccessError>;

    /// Number of members of a workspace holding `role`.
    async fn count_with_role(&self, workspace_id: i64, role: Role) -> Result<i64, AccessError>;

    /// Fails with [`AccessError::NotFound`] if no membership exists.
    async fn update_role(
        &self,
        workspace_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<Membership, AccessError>;

    async fn delete_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<(), AccessError>;
}

/// Owns pending and accepted invite tokens scoped to a workspace.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, data: CreateInvite) -> Result<WorkspaceInvite, AccessError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<WorkspaceInvite>, AccessError>;

    /// The token hash is the only lookup key for acceptance; invites are
    /// never enumerable by email through this trait's accept path.
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<WorkspaceInvite>, AccessError>;

    /// Pending (unaccepted, unexpired) invites of a workspace, newest
    /// first.
    async fn find_pending_by_workspace(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<WorkspaceInvite>, AccessError>;

    /// Whether a pending, unexpired invite for `email` exists in the
    /// workspace.
    async fn has_pending(&self, workspace_id: i64, email: &str) -> Result<bool, AccessError>;

    /// Atomic acceptance: claims `accepted_at` (only if still null),
    /// creates the membership with the invite's role, and points the
    /// user's active workspace at the joined workspace — one boundary.
    ///
    /// Exactly one of two concurrent calls on the same invite wins; the
    /// loser fails with [`AccessError::InviteAlreadyAccepted`]. A
    /// concurrent membership created by other means surfaces as
    /// [`AccessError::AlreadyMember`], leaving the invite unclaimed.
    async fn accept(
        &self,
        invite_id: i64,
        user_id: i64,
    ) -> Result<(WorkspaceInvite, Membership), AccessError>;

    /// Cancelation removes the row; canceled invites leave no trace.
    async fn delete(&self, id: i64) -> Result<(), AccessError>;
}

/// The narrow read/write surface of the host's user store this crate
/// consumes: lookups for invite binding and member lists, and the
/// active-workspace pointer.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserAccount>, AccessError>;

    /// Bulk fetch for member lists; result order is unspecified.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserAccount>, AccessError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccessError>;

    /// Points the user's default tenant context at `workspace_id`.
    async fn set_active_workspace(
        &self,
        user_id: i64,
        workspace_id: i64,
    ) -> Result<(), AccessError>;
}
