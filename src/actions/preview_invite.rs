use chrono::{DateTime, Utc};

use crate::crypto::{hash_token, SecretString};
use crate::repository::{InviteRepository, UserDirectory, WorkspaceRepository};
use crate::roles::Role;
use crate::AccessError;

/// What the join page may show about a pending invite.
#[derive(Debug, Clone)]
pub struct InvitePreview {
    pub workspace_name: String,
    /// The email the invite is bound to.
    pub email: String,
    pub role: Role,
    pub inviter_name: String,
    pub expires_at: DateTime<Utc>,
}

/// Action to preview an invite by its token, before the invitee signs in
/// or accepts.
///
/// The token is the only lookup key — there is no enumeration by
/// workspace or email on this path, so possession of the link is the only
/// way to see the preview. Used and expired invites preview as the same
/// errors acceptance would produce.
pub struct PreviewInviteAction<W, I, U>
where
    W: WorkspaceRepository,
    I: InviteRepository,
    U: UserDirectory,
{
    workspaces: W,
    invites: I,
    users: U,
}

impl<W, I, U> PreviewInviteAction<W, I, U>
where
    W: WorkspaceRepository,
    I: InviteRepository,
    U: UserDirectory,
{
    pub fn new(workspaces: W, invites: I, users: U) -> Self {
        Self {
            workspaces,
            invites,
            users,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "preview_invite", skip_all, err)
    )]
    pub async fn execute(&self, token: &SecretString) -> Result<InvitePreview, AccessError> {
        let token_hash = hash_token(token.expose_secret());

        let invite = self
            .invites
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(AccessError::NotFound)?;

        if invite.is_accepted() {
            return Err(AccessError::InviteAlreadyAccepted);
        }
        if invite.is_expired() {
            return Err(AccessError::InviteExpired);
        }

        let workspace = self
            .workspaces
            .find_by_id(invite.workspace_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        let inviter_name = self
            .users
            .find_by_id(invite.invited_by)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();

        Ok(InvitePreview {
            workspace_name: workspace.name,
            email: invite.email,
            role: invite.role,
            inviter_name,
            expires_at: invite.expires_at,
        })
    }
}
