use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::actions::membership_or_not_found;
use crate::repository::{MembershipRepository, UserDirectory};
use crate::roles::Role;
use crate::types::UserAccount;
use crate::AccessError;

/// One row of a workspace member list.
#[derive(Debug, Clone)]
pub struct MemberEntry {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

/// Action to list a workspace's members: Owner first, then join time
/// ascending, each joined with the user's email and display name via one
/// bulk directory fetch.
pub struct ListMembersAction<M, U>
where
    M: MembershipRepository,
    U: UserDirectory,
{
    memberships: M,
    users: U,
}

impl<M, U> ListMembersAction<M, U>
where
    M: MembershipRepository,
    U: UserDirectory,
{
    pub fn new(memberships: M, users: U) -> Self {
        Self { memberships, users }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_members", skip(self), err)
    )]
    pub async fn execute(
        &self,
        workspace_id: i64,
        actor_id: i64,
    ) -> Result<Vec<MemberEntry>, AccessError> {
        membership_or_not_found(&self.memberships, workspace_id, actor_id).await?;

        let memberships = self.memberships.find_by_workspace(workspace_id).await?;
        let user_ids: Vec<i64> = memberships.iter().map(|m| m.user_id).collect();
        let accounts: HashMap<i64, UserAccount> = self
            .users
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(memberships
            .into_iter()
            .map(|m| {
                let account = accounts.get(&m.user_id);
                MemberEntry {
                    user_id: m.user_id,
                    email: account.map(|a| a.email.clone()).unwrap_or_default(),
                    name: account.map(|a| a.name.clone()).unwrap_or_default(),
                    role: m.role,
                    joined_at: m.created_at,
                }
            })
            .collect())
    }
}
