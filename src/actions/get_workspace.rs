use crate::actions::membership_or_not_found;
use crate::repository::{MembershipRepository, WorkspaceRepository};
use crate::roles::Role;
use crate::types::Workspace;
use crate::AccessError;

/// A workspace together with the viewing member's role.
#[derive(Debug, Clone)]
pub struct WorkspaceView {
    pub workspace: Workspace,
    pub role: Role,
}

/// Action to fetch one workspace as a member.
///
/// Non-members get [`AccessError::NotFound`], identical to a workspace
/// that does not exist — outsiders never learn which ids are real.
pub struct GetWorkspaceAction<W, M>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
{
    workspaces: W,
    memberships: M,
}

impl<W, M> GetWorkspaceAction<W, M>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
{
    pub fn new(workspaces: W, memberships: M) -> Self {
        Self {
            workspaces,
            memberships,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_workspace", skip(self), err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
        actor_id: i64,
    ) -> Result<WorkspaceView, AccessError> {
        let membership =
            membership_or_not_found(&self.memberships, workspace_id, actor_id).await?;

        let workspace = self
            .workspaces
            .find_by_id(workspace_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        Ok(WorkspaceView {
            workspace,
            role: membership.role,
        })
    }
}
