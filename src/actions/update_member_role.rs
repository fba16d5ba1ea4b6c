use crate::actions::{membership_or_forbidden, require_managerial};
use crate::audit::{AuditEvent, AuditSink};
use crate::repository::MembershipRepository;
use crate::roles::Role;
use crate::types::Membership;
use crate::AccessError;

/// Action to change a member's role.
///
/// This action:
/// 1. Requires the actor to be Owner or Admin
/// 2. Shields the Owner's membership from everyone but the Owner
/// 3. Rejects any assignment of the Owner role — ownership is never
///    granted or given up through this path
pub struct UpdateMemberRoleAction<M, A>
where
    M: MembershipRepository,
    A: AuditSink,
{
    memberships: M,
    audit: A,
}

impl<M, A> UpdateMemberRoleAction<M, A>
where
    M: MembershipRepository,
    A: AuditSink,
{
    pub fn new(memberships: M, audit: A) -> Self {
        Self { memberships, audit }
    }

    /// Sets `target_user_id`'s role in the workspace to `new_role`.
    ///
    /// # Returns
    ///
    /// - `Ok(membership)` - Role updated
    /// - `Err(AccessError::Forbidden)` - Actor below Admin, or touching the Owner as non-Owner
    /// - `Err(AccessError::OwnerRoleImmutable)` - `new_role` is Owner, or the target is the Owner
    /// - `Err(AccessError::NotFound)` - Target holds no membership
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_member_role", skip(self), err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
        target_user_id: i64,
        actor_id: i64,
        new_role: Role,
    ) -> Result<Membership, AccessError> {
        let actor = membership_or_forbidden(&self.memberships, workspace_id, actor_id).await?;
        require_managerial(&actor)?;

        let target = self
            .memberships
            .find_by_workspace_and_user(workspace_id, target_user_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        if target.role == Role::Owner {
            // non-owners may not touch the owner's membership at all;
            // the owner may not give ownership up either
            if actor.role != Role::Owner {
                return Err(AccessError::Forbidden);
            }
            return Err(AccessError::OwnerRoleImmutable);
        }

        if new_role == Role::Owner {
            return Err(AccessError::OwnerRoleImmutable);
        }

        let membership = self
            .memberships
            .update_role(workspace_id, target_user_id, new_role)
            .await?;

        log::info!(
            target: "palisade",
            "msg=\"member role updated\", workspace_id={}, target_user_id={}, actor_id={}, role=\"{}\"",
            workspace_id,
            target_user_id,
            actor_id,
            new_role.as_str()
        );

        self.audit
            .record(
                AuditEvent::new(actor_id, "workspace.member.role_updated", "membership")
                    .workspace(workspace_id)
                    .entity_id(membership.id)
                    .metadata(format!("{{\"role\":\"{}\"}}", new_role.as_str())),
            )
            .await;

        Ok(membership)
    }
}
