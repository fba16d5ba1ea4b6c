use crate::actions::{membership_or_forbidden, require_managerial};
use crate::repository::{InviteRepository, MembershipRepository};
use crate::types::WorkspaceInvite;
use crate::AccessError;

/// Action to list a workspace's pending invites, newest first.
/// Accepted and expired invites never appear.
pub struct ListInvitesAction<M, I>
where
    M: MembershipRepository,
    I: InviteRepository,
{
    memberships: M,
    invites: I,
}

impl<M, I> ListInvitesAction<M, I>
where
    M: MembershipRepository,
    I: InviteRepository,
{
    pub fn new(memberships: M, invites: I) -> Self {
        Self {
            memberships,
            invites,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_invites", skip(self), err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
        actor_id: i64,
    ) -> Result<Vec<WorkspaceInvite>, AccessError> {
        let actor = membership_or_forbidden(&self.memberships, workspace_id, actor_id).await?;
        require_managerial(&actor)?;

        self.invites.find_pending_by_workspace(workspace_id).await
    }
}
