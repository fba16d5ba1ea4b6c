use crate::actions::{membership_or_forbidden, require_managerial};
use crate::audit::{AuditEvent, AuditSink};
use crate::repository::{InviteRepository, MembershipRepository};
use crate::AccessError;

/// Action to cancel a pending invite.
///
/// Cancelation removes the row outright. Accepted invites are immutable
/// history and cannot be canceled; invites belonging to another
/// workspace are reported exactly like missing ones.
pub struct CancelInviteAction<M, I, A>
where
    M: MembershipRepository,
    I: InviteRepository,
    A: AuditSink,
{
    memberships: M,
    invites: I,
    audit: A,
}

impl<M, I, A> CancelInviteAction<M, I, A>
where
    M: MembershipRepository,
    I: InviteRepository,
    A: AuditSink,
{
    pub fn new(memberships: M, invites: I, audit: A) -> Self {
        Self {
            memberships,
            invites,
            audit,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "cancel_invite", skip(self), err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
        invite_id: i64,
        actor_id: i64,
    ) -> Result<(), AccessError> {
        let actor = membership_or_forbidden(&self.memberships, workspace_id, actor_id).await?;
        require_managerial(&actor)?;

        let invite = self
            .invites
            .find_by_id(invite_id)
            .await?
            .filter(|i| i.workspace_id == workspace_id)
            .ok_or(AccessError::NotFound)?;

        if invite.is_accepted() {
            return Err(AccessError::InviteAlreadyAccepted);
        }

        self.invites.delete(invite_id).await?;

        log::info!(
            target: "palisade",
            "msg=\"invite canceled\", workspace_id={workspace_id}, invite_id={invite_id}, actor_id={actor_id}"
        );

        self.audit
            .record(
                AuditEvent::new(actor_id, "workspace.invite.canceled", "invite")
                    .workspace(workspace_id)
                    .entity_id(invite_id),
            )
            .await;

        Ok(())
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;
    use crate::actions::{CreateWorkspaceAction, InviteMemberAction, InviteMemberInput};
    use crate::audit::NullAuditSink;
    use crate::memory::MemoryStore;
    use crate::notify::NullNotifier;
    use crate::repository::CreateMembership;
    use crate::roles::Role;
    use crate::types::WorkspaceInvite;

    async fn setup() -> (MemoryStore, i64, i64, WorkspaceInvite) {
        let store = MemoryStore::new();
        let owner = store.add_user("owner@example.com", "Owner").unwrap();
        let created = CreateWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink)
            .execute(owner.id, "Acme")
            .await
            .unwrap();
        let invited = InviteMemberAction::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            NullNotifier,
            NullAuditSink,
        )
        .execute(InviteMemberInput {
            workspace_id: created.workspace.id,
            actor_id: owner.id,
            email: "b@example.com".to_owned(),
            role: Role::Member,
        })
        .await
        .unwrap();
        (store, owner.id, created.workspace.id, invited.invite)
    }

    fn action(store: &MemoryStore) -> CancelInviteAction<MemoryStore, MemoryStore, NullAuditSink> {
        CancelInviteAction::new(store.clone(), store.clone(), NullAuditSink)
    }

    #[tokio::test]
    async fn test_cancel_removes_invite() {
        let (store, owner_id, workspace_id, invite) = setup().await;

        action(&store)
            .execute(workspace_id, invite.id, owner_id)
            .await
            .unwrap();

        assert!(InviteRepository::find_by_id(&store, invite.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_cancel_from_other_workspace_is_not_found() {
        let (store, owner_id, _, invite) = setup().await;
        let other = CreateWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink)
            .execute(owner_id, "Beta")
            .await
            .unwrap();

        let result = action(&store)
            .execute(other.workspace.id, invite.id, owner_id)
            .await;
        assert_eq!(result.unwrap_err(), AccessError::NotFound);
    }

    #[tokio::test]
    async fn test_member_cannot_cancel() {
        let (store, _, workspace_id, invite) = setup().await;
        let member = store.add_user("m@example.com", "M").unwrap();
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

        let result = action(&store)
            .execute(workspace_id, invite.id, member.id)
            .await;
        assert_eq!(result.unwrap_err(), AccessError::Forbidden);
    }

    #[tokio::test]
    async fn test_accepted_invite_cannot_be_canceled() {
        let (store, owner_id, workspace_id, invite) = setup().await;
        let invitee = store.add_user("b@example.com", "B").unwrap();
        store.accept(invite.id, invitee.id).await.unwrap();

        let result = action(&store)
            .execute(workspace_id, invite.id, owner_id)
            .await;
        assert_eq!(result.unwrap_err(), AccessError::InviteAlreadyAccepted);
    }
}
