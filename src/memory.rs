//! In-memory store backing unit and end-to-end tests.
//!
//! One `MemoryStore` holds every table behind a single `RwLock`, so the
//! compound repository methods (workspace creation, invite acceptance)
//! are atomic within one write-lock scope — the same envelope the
//! postgres backend gets from a transaction. Clones share state, letting
//! several actions operate on the same store in a test.

#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::repository::{
    CreateInvite, CreateMembership, CreateWorkspace, InviteRepository, MembershipRepository,
    UserDirectory, WorkspaceRepository,
};
use crate::roles::Role;
use crate::types::{Membership, UserAccount, Workspace, WorkspaceInvite};
use crate::AccessError;

#[derive(Default)]
struct State {
    workspaces: HashMap<i64, Workspace>,
    memberships: HashMap<i64, Membership>,
    invites: HashMap<i64, WorkspaceInvite>,
    users: HashMap<i64, UserAccount>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared-state in-memory implementation of all four storage traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, AccessError> {
        self.inner
            .read()
            .map_err(|_| AccessError::Internal("lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, AccessError> {
        self.inner
            .write()
            .map_err(|_| AccessError::Internal("lock poisoned".into()))
    }

    /// Registers a host user; tests use this in place of the host
    /// application's signup flow.
    pub fn add_user(&self, email: &str, name: &str) -> Result<UserAccount, AccessError> {
        let mut state = self.write()?;
        let id = state.next_id();
        let user = UserAccount {
            id,
            email: email.to_owned(),
            name: name.to_owned(),
            active_workspace_id: None,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl WorkspaceRepository for MemoryStore {
    async fn create(&self, data: CreateWorkspace) -> Result<Workspace, AccessError> {
        let mut state = self.write()?;

        if state.workspaces.values().any(|w| w.slug == data.slug) {
            return Err(AccessError::SlugTaken);
        }

        let now = Utc::now();
        let workspace_id = state.next_id();
        let workspace = Workspace {
            id: workspace_id,
            name: data.name,
            slug: data.slug,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        state.workspaces.insert(workspace_id, workspace.clone());

        let membership_id = state.next_id();
        state.memberships.insert(
            membership_id,
            Membership {
                id: membership_id,
                workspace_id,
                user_id: data.owner_id,
                role: Role::Owner,
                created_at: now,
                updated_at: now,
            },
        );

        if let Some(user) = state.users.get_mut(&data.owner_id) {
            user.active_workspace_id = Some(workspace_id);
        }

        Ok(workspace)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Workspace>, AccessError> {
        let state = self.read()?;
        Ok(state.workspaces.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Workspace>, AccessError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.workspaces.get(id).cloned())
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Workspace>, AccessError> {
        let state = self.read()?;
        Ok(state.workspaces.values().find(|w| w.slug == slug).cloned())
    }

    async fn slugs_with_prefix(&self, base: &str) -> Result<Vec<String>, AccessError> {
        let state = self.read()?;
        let prefix = format!("{base}-");
        Ok(state
            .workspaces
            .values()
            .filter(|w| w.slug == base || w.slug.starts_with(&prefix))
            .map(|w| w.slug.clone())
            .collect())
    }

    async fn rename(&self, id: i64, name: &str) -> Result<Workspace, AccessError> {
        let mut state = self.write()?;
        let workspace = state.workspaces.get_mut(&id).ok_or(AccessError::NotFound)?;
        name.clone_into(&mut workspace.name);
        workspace.updated_at = Utc::now();
        Ok(workspace.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AccessError> {
        let mut state = self.write()?;
        state.workspaces.remove(&id);
        state.memberships.retain(|_, m| m.workspace_id != id);
        state.invites.retain(|_, i| i.workspace_id != id);
        for user in state.users.values_mut() {
            if user.active_workspace_id == Some(id) {
                user.active_workspace_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn create(&self, data: CreateMembership) -> Result<Membership, AccessError> {
        let mut state = self.write()?;

        if state
            .memberships
            .values()
            .any(|m| m.workspace_id == data.workspace_id && m.user_id == data.user_id)
        {
            return Err(AccessError::AlreadyMember);
        }

        let now = Utc::now();
        let id = state.next_id();
        let membership = Membership {
            id,
            workspace_id: data.workspace_id,
            user_id: data.user_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        state.memberships.insert(id, membership.clone());
        Ok(membership)
    }

    async fn find_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<Option<Membership>, AccessError> {
        let state = self.read()?;
        Ok(state
            .memberships
            .values()
            .find(|m| m.workspace_id == workspace_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_by_workspace(&self, workspace_id: i64) -> Result<Vec<Membership>, AccessError> {
        let state = self.read()?;
        let mut members: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.workspace_id == workspace_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.role != Role::Owner, m.created_at));
        Ok(members)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Membership>, AccessError> {
        let state = self.read()?;
        Ok(state
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_by_workspaces(
        &self,
        workspace_ids: &[i64],
    ) -> Result<HashMap<i64, i64>, AccessError> {
        let state = self.read()?;
        let mut counts = HashMap::new();
        for membership in state.memberships.values() {
            if workspace_ids.contains(&membership.workspace_id) {
                *counts.entry(membership.workspace_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn count_with_role(&self, workspace_id: i64, role: Role) -> Result<i64, AccessError> {
        let state = self.read()?;
        Ok(state
            .memberships
            .values()
            .filter(|m| m.workspace_id == workspace_id && m.role == role)
            .count() as i64)
    }

    async fn update_role(
        &self,
        workspace_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<Membership, AccessError> {
        let mut state = self.write()?;
        let membership = state
            .memberships
            .values_mut()
            .find(|m| m.workspace_id == workspace_id && m.user_id == user_id)
            .ok_or(AccessError::NotFound)?;
        membership.role = role;
        membership.updated_at = Utc::now();
        Ok(membership.clone())
    }

    async fn delete_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> Result<(), AccessError> {
        let mut state = self.write()?;
        state
            .memberships
            .retain(|_, m| !(m.workspace_id == workspace_id && m.user_id == user_id));
        Ok(())
    }
}

#[async_trait]
impl InviteRepository for MemoryStore {
    async fn create(&self, data: CreateInvite) -> Result<WorkspaceInvite, AccessError> {
        let mut state = self.write()?;
        let id = state.next_id();
        let invite = WorkspaceInvite {
            id,
            workspace_id: data.workspace_id,
            email: data.email,
            role: data.role,
            token_hash: data.token_hash,
            invited_by: data.invited_by,
            expires_at: data.expires_at,
            accepted_at: None,
            created_at: Utc::now(),
        };
        state.invites.insert(id, invite.clone());
        Ok(invite)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<WorkspaceInvite>, AccessError> {
        let state = self.read()?;
        Ok(state.invites.get(&id).cloned())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<WorkspaceInvite>, AccessError> {
        let state = self.read()?;
        Ok(state
            .invites
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn find_pending_by_workspace(
        &self,
        workspace_id: i64,
    ) -> Result<Vec<WorkspaceInvite>, AccessError> {
        let state = self.read()?;
        let now = Utc::now();
        let mut pending: Vec<WorkspaceInvite> = state
            .invites
            .values()
            .filter(|i| {
                i.workspace_id == workspace_id && i.accepted_at.is_none() && i.expires_at > now
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn has_pending(&self, workspace_id: i64, email: &str) -> Result<bool, AccessError> {
        let state = self.read()?;
        let now = Utc::now();
        Ok(state.invites.values().any(|i| {
            i.workspace_id == workspace_id
                && i.email == email
                && i.accepted_at.is_none()
                && i.expires_at > now
        }))
    }

    async fn accept(
        &self,
        invite_id: i64,
        user_id: i64,
    ) -> Result<(WorkspaceInvite, Membership), AccessError> {
        let mut state = self.write()?;

        let invite = state.invites.get(&invite_id).ok_or(AccessError::NotFound)?;
        if invite.accepted_at.is_some() {
            return Err(AccessError::InviteAlreadyAccepted);
        }
        let workspace_id = invite.workspace_id;
        let role = invite.role;

        if state
            .memberships
            .values()
            .any(|m| m.workspace_id == workspace_id && m.user_id == user_id)
        {
            return Err(AccessError::AlreadyMember);
        }

        let now = Utc::now();
        let membership_id = state.next_id();
        let membership = Membership {
            id: membership_id,
            workspace_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        };
        state.memberships.insert(membership_id, membership.clone());

        // invite_id was just read from the map under this same lock
        let invite = state
            .invites
            .get_mut(&invite_id)
            .ok_or_else(|| AccessError::Internal("invite vanished mid-accept".into()))?;
        invite.accepted_at = Some(now);
        let invite = invite.clone();

        if let Some(user) = state.users.get_mut(&user_id) {
            user.active_workspace_id = Some(workspace_id);
        }

        Ok((invite, membership))
    }

    async fn delete(&self, id: i64) -> Result<(), AccessError> {
        let mut state = self.write()?;
        state.invites.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserAccount>, AccessError> {
        let state = self.read()?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<UserAccount>, AccessError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccessError> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_active_workspace(
        &self,
        user_id: i64,
        workspace_id: i64,
    ) -> Result<(), AccessError> {
        let mut state = self.write()?;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.active_workspace_id = Some(workspace_id);
        }
        Ok(())
    }
}
