use crate::actions::membership_or_forbidden;
use crate::audit::{AuditEvent, AuditSink};
use crate::repository::{MembershipRepository, WorkspaceRepository};
use crate::roles::Role;
use crate::types::Workspace;
use crate::validators::validate_workspace_name;
use crate::AccessError;

/// Action to rename a workspace. Owner only; the slug is permanent and
/// does not follow the new name.
pub struct RenameWorkspaceAction<W, M, A>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    A: AuditSink,
{
    workspaces: W,
    memberships: M,
    audit: A,
}

impl<W, M, A> RenameWorkspaceAction<W, M, A>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    A: AuditSink,
{
    pub fn new(workspaces: W, memberships: M, audit: A) -> Self {
        Self {
            workspaces,
            memberships,
            audit,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "rename_workspace", skip(self, name), err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
        actor_id: i64,
        name: &str,
    ) -> Result<Workspace, AccessError> {
        let membership =
            membership_or_forbidden(&self.memberships, workspace_id, actor_id).await?;
        if membership.role != Role::Owner {
            return Err(AccessError::Forbidden);
        }

        validate_workspace_name(name)?;

        let workspace = self.workspaces.rename(workspace_id, name).await?;

        log::info!(
            target: "palisade",
            "msg=\"workspace renamed\", workspace_id={workspace_id}, actor_id={actor_id}"
        );

        self.audit
            .record(
                AuditEvent::new(actor_id, "workspace.renamed", "workspace")
                    .workspace(workspace_id)
                    .entity_id(workspace_id),
            )
            .await;

        Ok(workspace)
    }
}
