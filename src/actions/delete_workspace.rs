use crate::actions::membership_or_forbidden;
use crate::audit::{AuditEvent, AuditSink};
use crate::repository::{MembershipRepository, WorkspaceRepository};
use crate::roles::Role;
use crate::AccessError;

/// Action to delete a workspace. Owner only, irreversible; the store
/// cascades memberships and invites and clears dangling active-workspace
/// pointers.
pub struct DeleteWorkspaceAction<W, M, A>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    A: AuditSink,
{
    workspaces: W,
    memberships: M,
    audit: A,
}

impl<W, M, A> DeleteWorkspaceAction<W, M, A>
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
        tracing::instrument(name = "delete_workspace", skip(self), err)
    )]
    pub async fn execute(&self, workspace_id: i64, actor_id: i64) -> Result<(), AccessError> {
        let membership =
            membership_or_forbidden(&self.memberships, workspace_id, actor_id).await?;
        if membership.role != Role::Owner {
            return Err(AccessError::Forbidden);
        }

        self.workspaces.delete(workspace_id).await?;

        log::info!(
            target: "palisade",
            "msg=\"workspace deleted\", workspace_id={workspace_id}, actor_id={actor_id}"
        );

        self.audit
            .record(
                AuditEvent::new(actor_id, "workspace.deleted", "workspace")
                    .workspace(workspace_id)
                    .entity_id(workspace_id),
            )
            .await;

        Ok(())
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::actions::CreateWorkspaceAction;
    use crate::audit::NullAuditSink;
    use crate::memory::MemoryStore;
    use crate::repository::CreateMembership;

    async fn setup() -> (MemoryStore, i64, i64) {
        let store = MemoryStore::new();
        let owner = store.add_user("a@example.com", "A").unwrap();
        let created = CreateWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink)
            .execute(owner.id, "Acme")
            .await
            .unwrap();
        (store, owner.id, created.workspace.id)
    }

    #[tokio::test]
    async fn test_owner_deletes_and_memberships_cascade() {
        let (store, owner_id, workspace_id) = setup().await;
        let member = store.add_user("b@example.com", "B").unwrap();
        MembershipRepository::create(
            &store,
            CreateMembership {
                workspace_id,
                user_id: member.id,
                role: Role::Member,
            },
        )
        .await
        .unwrap();

        let action = DeleteWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink);
        action.execute(workspace_id, owner_id).await.unwrap();

        assert!(store.find_by_workspace(workspace_id).await.unwrap().is_empty());
        assert!(WorkspaceRepository::find_by_id(&store, workspace_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_admin_cannot_delete() {
        let (store, _, workspace_id) = setup().await;
        let admin = store.add_user("b@example.com", "B").unwrap();
        MembershipRepository::create(
            &store,
            CreateMembership {
                workspace_id,
                user_id: admin.id,
                role: Role::Admin,
            },
        )
        .await
        .unwrap();

        let action = DeleteWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink);
        let result = action.execute(workspace_id, admin.id).await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);
    }

    #[tokio::test]
    async fn test_non_member_cannot_delete() {
        let (store, _, workspace_id) = setup().await;
        let outsider = store.add_user("b@example.com", "B").unwrap();

        let action = DeleteWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink);
        let result = action.execute(workspace_id, outsider.id).await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);
    }
}
