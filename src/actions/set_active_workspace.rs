use crate::actions::membership_or_forbidden;
use crate::repository::{MembershipRepository, UserDirectory};
use crate::AccessError;

/// Action to switch the actor's active workspace.
///
/// Requires an existing membership in the target workspace; updates the
/// pointer and nothing else.
pub struct SetActiveWorkspaceAction<M, U>
where
    M: MembershipRepository,
    U: UserDirectory,
{
    memberships: M,
    users: U,
}

impl<M, U> SetActiveWorkspaceAction<M, U>
where
    M: MembershipRepository,
    U: UserDirectory,
{
    pub fn new(memberships: M, users: U) -> Self {
        Self { memberships, users }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "set_active_workspace", skip(self), err)
    )]
    pub async fn execute(&self, actor_id: i64, workspace_id: i64) -> Result<(), AccessError> {
        membership_or_forbidden(&self.memberships, workspace_id, actor_id).await?;

        self.users
            .set_active_workspace(actor_id, workspace_id)
            .await?;

        log::debug!(
            target: "palisade",
            "msg=\"active workspace switched\", user_id={actor_id}, workspace_id={workspace_id}"
        );

        Ok(())
    }
}
