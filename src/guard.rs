//! The request-time authorization guard.
//!
//! Every protected operation runs through [`AuthorizationGuard::authorize`]
//! before touching persisted state: resolve the workspace the request acts
//! in, load the actor's membership, and check the operation's declared
//! requirement against the injected [`PermissionTable`]. On success the
//! resolved scope is handed back for the transport to attach to its
//! request context, so downstream services never re-resolve it.
//!
//! The workspace-resolution precedence (path param → query arg → body
//! field → active-workspace pointer) is a pure function over a flattened
//! [`WorkspaceSelector`], independent of any transport's request shape;
//! the guard only adds the async pointer lookup for the final fallback.

use crate::permissions::PermissionTable;
use crate::repository::{MembershipRepository, UserDirectory};
use crate::roles::{Permission, Role};
use crate::AccessError;

/// The workspace references a transport extracted from one request,
/// flattened out of its routing/parsing machinery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkspaceSelector {
    /// Workspace id from the route path, if the route carries one.
    pub param: Option<i64>,
    /// Workspace id from the query string.
    pub query: Option<i64>,
    /// Workspace id from the request body.
    pub body: Option<i64>,
}

impl WorkspaceSelector {
    /// A selector naming the workspace explicitly via the path param.
    #[must_use]
    pub fn param(workspace_id: i64) -> Self {
        Self {
            param: Some(workspace_id),
            ..Self::default()
        }
    }

    /// A selector with no explicit workspace; resolution falls through to
    /// the actor's active-workspace pointer.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// The precedence decision: first explicit reference wins, the actor's
/// active-workspace pointer is the final fallback.
#[must_use]
pub fn resolve_workspace(selector: WorkspaceSelector, active: Option<i64>) -> Option<i64> {
    selector.param.or(selector.query).or(selector.body).or(active)
}

/// What an operation declares it needs, fixed at route-registration time.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    /// Any membership in the resolved workspace suffices.
    Membership,
    /// Every listed permission must be granted by the actor's role
    /// (AND semantics — a partial match is rejected).
    Permissions(Vec<Permission>),
}

/// The authorization result attached to the request context: which
/// workspace the request acts in and as what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthScope {
    pub workspace_id: i64,
    pub user_id: i64,
    pub role: Role,
}

/// Request-time authorization check gating protected operations.
pub struct AuthorizationGuard<M, U>
where
    M: MembershipRepository,
    U: UserDirectory,
{
    memberships: M,
    users: U,
    table: PermissionTable,
}

impl<M, U> AuthorizationGuard<M, U>
where
    M: MembershipRepository,
    U: UserDirectory,
{
    /// Creates a guard over the given stores and permission table. The
    /// table is owned, immutable configuration — construct it once at
    /// startup and clone it into each guard.
    pub fn new(memberships: M, users: U, table: PermissionTable) -> Self {
        Self {
            memberships,
            users,
            table,
        }
    }

    /// Authorizes `actor_id` for one request.
    ///
    /// # Returns
    ///
    /// - `Ok(scope)` - Authorized; scope carries the resolved workspace and role
    /// - `Err(AccessError::WorkspaceRequired)` - No workspace resolved
    /// - `Err(AccessError::Forbidden)` - No membership in the workspace
    /// - `Err(AccessError::MissingPermissions(_))` - Requirement not met
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "authorize", skip(self, requirement), err)
    )]
    pub async fn authorize(
        &self,
        actor_id: i64,
        selector: WorkspaceSelector,
        requirement: &Requirement,
    ) -> Result<AuthScope, AccessError> {
        let explicit = resolve_workspace(selector, None);
        let workspace_id = match explicit {
            Some(id) => id,
            None => {
                let active = self
                    .users
                    .find_by_id(actor_id)
                    .await?
                    .and_then(|u| u.active_workspace_id);
                resolve_workspace(selector, active).ok_or(AccessError::WorkspaceRequired)?
            }
        };

        let membership = self
            .memberships
            .find_by_workspace_and_user(workspace_id, actor_id)
            .await?
            .ok_or(AccessError::Forbidden)?;

        if let Requirement::Permissions(required) = requirement {
            let granted = self.table.permissions_of(membership.role);
            let missing = granted.missing_from(required);
            if !missing.is_empty() {
                log::warn!(
                    target: "palisade",
                    "msg=\"permission check failed\", user_id={}, workspace_id={}, role=\"{}\", missing=\"{}\"",
                    actor_id,
                    workspace_id,
                    membership.role.as_str(),
                    missing.join(", ")
                );
                return Err(AccessError::MissingPermissions(missing));
            }
        }

        Ok(AuthScope {
            workspace_id,
            user_id: actor_id,
            role: membership.role,
        })
    }
}

#[cfg(test)]
mod resolution_tests {
    use super::*;

    #[test]
    fn test_param_beats_everything() {
        let selector = WorkspaceSelector {
            param: Some(1),
            query: Some(2),
            body: Some(3),
        };
        assert_eq!(resolve_workspace(selector, Some(4)), Some(1));
    }

    #[test]
    fn test_precedence_chain() {
        let query_only = WorkspaceSelector {
            param: None,
            query: Some(2),
            body: Some(3),
        };
        assert_eq!(resolve_workspace(query_only, Some(4)), Some(2));

        let body_only = WorkspaceSelector {
            param: None,
            query: None,
            body: Some(3),
        };
        assert_eq!(resolve_workspace(body_only, Some(4)), Some(3));

        assert_eq!(resolve_workspace(WorkspaceSelector::none(), Some(4)), Some(4));
        assert_eq!(resolve_workspace(WorkspaceSelector::none(), None), None);
    }
}
