//! One action per exposed operation.
//!
//! Each action owns the repositories it needs, takes the authenticated
//! actor's id plus typed arguments, re-validates the role invariants the
//! operation depends on, and performs the mutation through a single
//! atomic store call where the invariant demands one. Membership-gate
//! failures follow the crate-wide policy: read paths report non-members
//! with [`crate::AccessError::NotFound`] so existence never leaks, write
//! paths report [`crate::AccessError::Forbidden`].

mod accept_invite;
mod cancel_invite;
mod create_workspace;
mod delete_workspace;
mod get_workspace;
mod invite_member;
mod list_invites;
mod list_members;
mod list_workspaces;
mod preview_invite;
mod remove_member;
mod rename_workspace;
mod set_active_workspace;
mod update_member_role;

pub use accept_invite::{AcceptInviteAction, AcceptedInvite};
pub use cancel_invite::CancelInviteAction;
pub use create_workspace::{CreateWorkspaceAction, CreatedWorkspace};
pub use delete_workspace::DeleteWorkspaceAction;
pub use get_workspace::{GetWorkspaceAction, WorkspaceView};
pub use invite_member::{InviteMemberAction, InviteMemberInput, InviteMemberOutput};
pub use list_invites::ListInvitesAction;
pub use list_members::{ListMembersAction, MemberEntry};
pub use list_workspaces::{ListWorkspacesAction, WorkspaceSummary};
pub use preview_invite::{InvitePreview, PreviewInviteAction};
pub use remove_member::RemoveMemberAction;
pub use rename_workspace::RenameWorkspaceAction;
pub use set_active_workspace::SetActiveWorkspaceAction;
pub use update_member_role::UpdateMemberRoleAction;

use crate::repository::MembershipRepository;
use crate::types::Membership;
use crate::AccessError;

/// Loads the actor's membership for a read operation; absence is
/// indistinguishable from a missing workspace.
pub(crate) async fn membership_or_not_found<M: MembershipRepository>(
    memberships: &M,
    workspace_id: i64,
    user_id: i64,
) -> Result<Membership, AccessError> {
    memberships
        .find_by_workspace_and_user(workspace_id, user_id)
        .await?
        .ok_or(AccessError::NotFound)
}

/// Loads the actor's membership for a write operation.
pub(crate) async fn membership_or_forbidden<M: MembershipRepository>(
    memberships: &M,
    workspace_id: i64,
    user_id: i64,
) -> Result<Membership, AccessError> {
    memberships
        .find_by_workspace_and_user(workspace_id, user_id)
        .await?
        .ok_or(AccessError::Forbidden)
}

/// Rejects actors below Admin.
pub(crate) fn require_managerial(membership: &Membership) -> Result<(), AccessError> {
    if membership.role.is_managerial() {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}
