use std::collections::HashMap;

use crate::repository::{MembershipRepository, WorkspaceRepository};
use crate::roles::Role;
use crate::types::Workspace;
use crate::AccessError;

/// One row of a user's workspace list.
#[derive(Debug, Clone)]
pub struct WorkspaceSummary {
    pub workspace: Workspace,
    /// The listing user's role in this workspace.
    pub role: Role,
    pub member_count: i64,
}

/// Action to list every workspace the actor belongs to.
///
/// Three bulk fetches regardless of how many workspaces the actor is in:
/// their memberships, the referenced workspaces, and one grouped member
/// count — never a per-workspace round trip.
pub struct ListWorkspacesAction<W, M>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
{
    workspaces: W,
    memberships: M,
}

impl<W, M> ListWorkspacesAction<W, M>
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

    /// Lists the actor's workspaces, oldest first.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_workspaces", skip(self), err)
    )]
    pub async fn execute(&self, actor_id: i64) -> Result<Vec<WorkspaceSummary>, AccessError> {
        let memberships = self.memberships.find_by_user(actor_id).await?;
        if memberships.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = memberships.iter().map(|m| m.workspace_id).collect();
        let workspaces = self.workspaces.find_by_ids(&ids).await?;
        let counts = self.memberships.count_by_workspaces(&ids).await?;

        let roles: HashMap<i64, Role> = memberships
            .into_iter()
            .map(|m| (m.workspace_id, m.role))
            .collect();

        let mut summaries: Vec<WorkspaceSummary> = workspaces
            .into_iter()
            .filter_map(|workspace| {
                let role = roles.get(&workspace.id).copied()?;
                let member_count = counts.get(&workspace.id).copied().unwrap_or(0);
                Some(WorkspaceSummary {
                    workspace,
                    role,
                    member_count,
                })
            })
            .collect();
        summaries.sort_by_key(|s| s.workspace.created_at);

        Ok(summaries)
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::audit::NullAuditSink;
    use crate::actions::CreateWorkspaceAction;
    use crate::memory::MemoryStore;
    use crate::repository::{CreateMembership, MembershipRepository};

    #[tokio::test]
    async fn test_empty_for_user_without_memberships() {
        let store = MemoryStore::new();
        let user = store.add_user("a@example.com", "A").unwrap();

        let action = ListWorkspacesAction::new(store.clone(), store.clone());
        let summaries = action.execute(user.id).await.unwrap();
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn test_lists_role_and_member_count() {
        let store = MemoryStore::new();
        let a = store.add_user("a@example.com", "A").unwrap();
        let b = store.add_user("b@example.com", "B").unwrap();

        let create = CreateWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink);
        let first = create.execute(a.id, "Acme").await.unwrap();
        let second = create.execute(b.id, "Beta").await.unwrap();

        // a joins b's workspace as a member
        MembershipRepository::create(
            &store,
            CreateMembership {
                workspace_id: second.workspace.id,
                user_id: a.id,
                role: Role::Member,
            },
        )
        .await
        .unwrap();

        let action = ListWorkspacesAction::new(store.clone(), store.clone());
        let summaries = action.execute(a.id).await.unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].workspace.id, first.workspace.id);
        assert_eq!(summaries[0].role, Role::Owner);
        assert_eq!(summaries[0].member_count, 1);
        assert_eq!(summaries[1].workspace.id, second.workspace.id);
        assert_eq!(summaries[1].role, Role::Member);
        assert_eq!(summaries[1].member_count, 2);
    }
}
