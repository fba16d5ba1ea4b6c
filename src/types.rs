//! Core record types for workspaces, memberships, and invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// A workspace is the tenant boundary grouping users and their resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier.
    pub id: i64,
    /// Human-readable display name.
    pub name: String,
    /// Globally unique, URL-safe identifier.
    pub slug: String,
    /// User ID of the workspace owner (the creator).
    pub owner_id: i64,
    /// When the workspace was created.
    pub created_at: DateTime<Utc>,
    /// When the workspace was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Binds one user to one workspace with exactly one role.
///
/// At most one membership exists per (user, workspace) pair, and every
/// workspace has exactly one [`Role::Owner`] membership from creation to
/// deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique identifier.
    pub id: i64,
    /// The workspace this membership belongs to.
    pub workspace_id: i64,
    /// The user who is a member.
    pub user_id: i64,
    /// The member's role within the workspace.
    pub role: Role,
    /// When the user joined the workspace.
    pub created_at: DateTime<Utc>,
    /// When the membership was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A time-bounded, single-use, token-addressed offer to join a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInvite {
    /// Unique identifier.
    pub id: i64,
    /// The workspace being invited to.
    pub workspace_id: i64,
    /// Email of the invitee. Acceptance requires an exact match against
    /// the accepting user's registered email.
    pub email: String,
    /// Role to assign when accepted.
    pub role: Role,
    /// SHA-256 hash of the invitation token. The plain token is returned
    /// exactly once at creation and never stored.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// User ID of the member who sent the invitation.
    pub invited_by: i64,
    /// When the invitation expires. Checked lazily at use time.
    pub expires_at: DateTime<Utc>,
    /// When the invitation was accepted, if it has been.
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the invitation was created.
    pub created_at: DateTime<Utc>,
}

impl WorkspaceInvite {
    /// Check if the invitation has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Check if the invitation has been accepted.
    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }
}

/// The narrow view of a host-application user this crate consumes:
/// identity, email, display name, and the active-workspace pointer used
/// as the default tenant context when a request names no workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique identifier.
    pub id: i64,
    /// Registered email, the identity invites are bound to.
    pub email: String,
    /// Display name, used when rendering invites and member lists.
    pub name: String,
    /// The user's currently selected workspace, if any. A weak reference:
    /// it governs default workspace resolution only, never access.
    pub active_workspace_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(expires_at: DateTime<Utc>, accepted_at: Option<DateTime<Utc>>) -> WorkspaceInvite {
        WorkspaceInvite {
            id: 1,
            workspace_id: 1,
            email: "test@example.com".to_owned(),
            role: Role::Member,
            token_hash: "hash".to_owned(),
            invited_by: 1,
            expires_at,
            accepted_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invite_is_expired() {
        let expired = invite(Utc::now() - Duration::hours(1), None);
        assert!(expired.is_expired());

        let valid = invite(Utc::now() + Duration::hours(1), None);
        assert!(!valid.is_expired());
    }

    #[test]
    fn test_invite_is_accepted() {
        let pending = invite(Utc::now() + Duration::days(7), None);
        assert!(!pending.is_accepted());

        let accepted = invite(Utc::now() + Duration::days(7), Some(Utc::now()));
        assert!(accepted.is_accepted());
    }

    #[test]
    fn test_invite_serialization_omits_token_hash() {
        let json = serde_json::to_string(&invite(Utc::now(), None)).unwrap();
        assert!(!json.contains("token_hash"));
        assert!(!json.contains("hash"));
    }
}
