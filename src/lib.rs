//! Workspace membership and role-based authorization for multi-tenant
//! services.
//!
//! `palisade` owns the tenant boundary of a SaaS backend: workspaces, the
//! (user, workspace) → role relation, token-addressed single-use
//! invitations, and the request-time authorization guard. It is
//! storage-agnostic (repository traits with an in-memory store behind the
//! `mocks` feature and a PostgreSQL backend behind `postgres`) and
//! transport-agnostic: each operation is an action struct the host's HTTP
//! layer calls with an authenticated actor id.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use palisade::actions::CreateWorkspaceAction;
//! use palisade::audit::LogAuditSink;
//! use palisade::memory::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let action = CreateWorkspaceAction::new(store.clone(), store.clone(), LogAuditSink);
//! let created = action.execute(actor_id, "Acme").await?;
//! ```

pub mod actions;
pub mod audit;
pub mod config;
pub mod crypto;
pub mod guard;
pub mod notify;
pub mod permissions;
pub mod repository;
pub mod roles;
pub mod slug;
pub mod types;
pub mod validators;

#[cfg(feature = "mocks")]
pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use crypto::SecretString;
pub use guard::{AuthScope, AuthorizationGuard, Requirement, WorkspaceSelector};
pub use permissions::{PermissionSet, PermissionTable};
pub use repository::{
    CreateInvite, CreateMembership, CreateWorkspace, InviteRepository, MembershipRepository,
    UserDirectory, WorkspaceRepository,
};
pub use roles::{Permission, Resource, Role, Verb};
pub use types::{Membership, UserAccount, Workspace, WorkspaceInvite};
pub use validators::ValidationError;

use std::fmt;

/// Coarse classification of an [`AccessError`], mirroring how a transport
/// layer maps failures to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity absent, or its existence hidden from a non-member.
    NotFound,
    /// Authenticated but insufficient role, permission, or identity.
    Forbidden,
    /// A business-rule violation terminal for the operation.
    InvalidState,
    /// Storage or collaborator failure unrelated to the request itself.
    Internal,
}

/// Errors produced by workspace, membership, and invitation operations.
///
/// Variants are deliberately flat so callers can match on the exact
/// failure; [`AccessError::kind`] collapses them into the four classes a
/// transport cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The workspace, invite, or membership does not exist — or the caller
    /// is not allowed to learn that it does.
    NotFound,
    /// The actor holds no membership or an insufficient role.
    Forbidden,
    /// A permission-set check failed; carries the missing permission names.
    MissingPermissions(Vec<String>),
    /// No workspace could be resolved from the request or the actor's
    /// active-workspace pointer.
    WorkspaceRequired,
    /// The accepting user's email does not match the invite's target.
    EmailMismatch,
    /// The user already holds a membership in the workspace.
    AlreadyMember,
    /// A pending invite for this email already exists in the workspace.
    AlreadyInvited,
    /// The invite was already accepted; accepted invites are immutable.
    InviteAlreadyAccepted,
    /// The invite's expiry timestamp has passed.
    InviteExpired,
    /// Owner can never be granted — or given up — through the
    /// role-update or invite path; ownership transfer is not exposed.
    OwnerRoleImmutable,
    /// The workspace owner cannot be removed from their own workspace.
    OwnerNotRemovable,
    /// Removing this member would leave the workspace without an admin.
    LastAdmin,
    /// A stored role string did not parse into a known [`Role`].
    UnknownRole(String),
    /// The slug is already taken; stores raise this on their unique
    /// constraint so the creation retry loop can pick the next suffix.
    SlugTaken,
    /// Input failed validation before any state was touched.
    Validation(ValidationError),
    /// The backing store reported an error.
    Database(String),
    Internal(String),
}

impl AccessError {
    /// Classifies this error into one of the four transport-facing kinds.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden | Self::MissingPermissions(_) | Self::EmailMismatch => {
                ErrorKind::Forbidden
            }
            Self::WorkspaceRequired
            | Self::AlreadyMember
            | Self::AlreadyInvited
            | Self::InviteAlreadyAccepted
            | Self::InviteExpired
            | Self::OwnerRoleImmutable
            | Self::OwnerNotRemovable
            | Self::LastAdmin
            | Self::SlugTaken
            | Self::Validation(_) => ErrorKind::InvalidState,
            Self::UnknownRole(_) | Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::NotFound => write!(f, "Not found"),
            AccessError::Forbidden => write!(f, "Forbidden"),
            AccessError::MissingPermissions(missing) => {
                write!(f, "Missing permissions: {}", missing.join(", "))
            }
            AccessError::WorkspaceRequired => write!(f, "No workspace specified or selected"),
            AccessError::EmailMismatch => write!(f, "Invite was issued to a different email"),
            AccessError::AlreadyMember => write!(f, "User is already a member of this workspace"),
            AccessError::AlreadyInvited => {
                write!(f, "A pending invite for this email already exists")
            }
            AccessError::InviteAlreadyAccepted => write!(f, "Invite has already been accepted"),
            AccessError::InviteExpired => write!(f, "Invite has expired"),
            AccessError::OwnerRoleImmutable => {
                write!(f, "The owner role cannot be granted or given up")
            }
            AccessError::OwnerNotRemovable => write!(f, "The workspace owner cannot be removed"),
            AccessError::LastAdmin => {
                write!(f, "Cannot remove the only admin of the workspace")
            }
            AccessError::UnknownRole(role) => write!(f, "Unknown role: {role}"),
            AccessError::SlugTaken => write!(f, "Workspace slug is already taken"),
            AccessError::Validation(err) => write!(f, "{err}"),
            AccessError::Database(msg) => write!(f, "Database error: {msg}"),
            AccessError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AccessError {}

impl From<ValidationError> for AccessError {
    fn from(err: ValidationError) -> Self {
        AccessError::Validation(err)
    }
}
