use crate::actions::{membership_or_forbidden, require_managerial};
use crate::audit::{AuditEvent, AuditSink};
use crate::repository::MembershipRepository;
use crate::roles::Role;
use crate::AccessError;

/// Action to remove a member from a workspace.
///
/// The Owner can never be removed through this path, and an Admin cannot
/// remove themself while being the workspace's only Admin — self-removal
/// must not leave the workspace administratively orphaned. The check
/// guards the Admin role only; the Owner always remains as the backstop.
pub struct RemoveMemberAction<M, A>
where
    M: MembershipRepository,
    A: AuditSink,
{
    memberships: M,
    audit: A,
}

impl<M, A> RemoveMemberAction<M, A>
where
    M: MembershipRepository,
    A: AuditSink,
{
    pub fn new(memberships: M, audit: A) -> Self {
        Self { memberships, audit }
    }

    /// Removes `target_user_id` from the workspace.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Membership deleted
    /// - `Err(AccessError::Forbidden)` - Actor below Admin
    /// - `Err(AccessError::NotFound)` - Target holds no membership
    /// - `Err(AccessError::OwnerNotRemovable)` - Target is the Owner
    /// - `Err(AccessError::LastAdmin)` - Admin self-removal would orphan the workspace
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "remove_member", skip(self), err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
        target_user_id: i64,
        actor_id: i64,
    ) -> Result<(), AccessError> {
        let actor = membership_or_forbidden(&self.memberships, workspace_id, actor_id).await?;
        require_managerial(&actor)?;

        let target = self
            .memberships
            .find_by_workspace_and_user(workspace_id, target_user_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        if target.role == Role::Owner {
            return Err(AccessError::OwnerNotRemovable);
        }

        if target_user_id == actor_id && actor.role == Role::Admin {
            let admins = self
                .memberships
                .count_with_role(workspace_id, Role::Admin)
                .await?;
            if admins <= 1 {
                return Err(AccessError::LastAdmin);
            }
        }

        self.memberships
            .delete_by_workspace_and_user(workspace_id, target_user_id)
            .await?;

        log::info!(
            target: "palisade",
            "msg=\"member removed\", workspace_id={workspace_id}, target_user_id={target_user_id}, actor_id={actor_id}"
        );

        self.audit
            .record(
                AuditEvent::new(actor_id, "workspace.member.removed", "membership")
                    .workspace(workspace_id)
                    .entity_id(target.id),
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

    struct Fixture {
        store: MemoryStore,
        workspace_id: i64,
        owner_id: i64,
        admin_id: i64,
        member_id: i64,
    }

    async fn setup() -> Fixture {
        let store = MemoryStore::new();
        let owner = store.add_user("owner@example.com", "Owner").unwrap();
        let admin = store.add_user("admin@example.com", "Admin").unwrap();
        let member = store.add_user("member@example.com", "Member").unwrap();
        let created = CreateWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink)
            .execute(owner.id, "Acme")
            .await
            .unwrap();
        for (user_id, role) in [(admin.id, Role::Admin), (member.id, Role::Member)] {
            MembershipRepository::create(
                &store,
                CreateMembership {
                    workspace_id: created.workspace.id,
                    user_id,
                    role,
                },
            )
            .await
            .unwrap();
        }
        Fixture {
            store,
            workspace_id: created.workspace.id,
            owner_id: owner.id,
            admin_id: admin.id,
            member_id: member.id,
        }
    }

    fn action(store: &MemoryStore) -> RemoveMemberAction<MemoryStore, NullAuditSink> {
        RemoveMemberAction::new(store.clone(), NullAuditSink)
    }

    #[tokio::test]
    async fn test_admin_removes_member() {
        let f = setup().await;

        action(&f.store)
            .execute(f.workspace_id, f.member_id, f.admin_id)
            .await
            .unwrap();

        assert!(f
            .store
            .find_by_workspace_and_user(f.workspace_id, f.member_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_member_cannot_remove() {
        let f = setup().await;

        let result = action(&f.store)
            .execute(f.workspace_id, f.admin_id, f.member_id)
            .await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);
    }

    #[tokio::test]
    async fn test_owner_never_removable() {
        let f = setup().await;

        let by_admin = action(&f.store)
            .execute(f.workspace_id, f.owner_id, f.admin_id)
            .await;
        assert_eq!(by_admin.unwrap_err(), AccessError::OwnerNotRemovable);

        let by_self = action(&f.store)
            .execute(f.workspace_id, f.owner_id, f.owner_id)
            .await;
        assert_eq!(by_self.unwrap_err(), AccessError::OwnerNotRemovable);
    }

    #[tokio::test]
    async fn test_only_admin_cannot_remove_self() {
        let f = setup().await;

        let result = action(&f.store)
            .execute(f.workspace_id, f.admin_id, f.admin_id)
            .await;
        assert_eq!(result.unwrap_err(), AccessError::LastAdmin);
    }

    #[tokio::test]
    async fn test_admin_self_removal_allowed_with_second_admin() {
        let f = setup().await;
        let second = f.store.add_user("admin2@example.com", "Admin2").unwrap();
        MembershipRepository::create(
            &f.store,
            CreateMembership {
                workspace_id: f.workspace_id,
                user_id: second.id,
                role: Role::Admin,
            },
        )
        .await
        .unwrap();

        action(&f.store)
            .execute(f.workspace_id, f.admin_id, f.admin_id)
            .await
            .unwrap();

        assert!(f
            .store
            .find_by_workspace_and_user(f.workspace_id, f.admin_id)
            .await
            .unwrap()
            .is_none());
    }
}
