use crate::audit::{AuditEvent, AuditSink};
use crate::crypto::{hash_token, SecretString};
use crate::repository::{InviteRepository, UserDirectory};
use crate::types::Membership;
use crate::AccessError;

/// The result of accepting an invite.
#[derive(Debug, Clone)]
pub struct AcceptedInvite {
    /// The membership the actor just gained.
    pub membership: Membership,
    /// The workspace joined; also the actor's new active workspace.
    pub workspace_id: i64,
}

/// Action to accept an invitation with its token.
///
/// This action:
/// 1. Looks the invite up by the presented token's hash — the token is
///    the only key, nothing here enumerates invites
/// 2. Rejects used invites, expired invites, and actors whose registered
///    email is not an exact match for the invite's target
/// 3. Hands the claim to the store's atomic accept: membership creation,
///    `accepted_at`, and the actor's active-workspace pointer commit or
///    fail together, and the single-use check is re-run at that boundary
///    so concurrent accepts of one token produce exactly one membership
pub struct AcceptInviteAction<I, U, A>
where
    I: InviteRepository,
    U: UserDirectory,
    A: AuditSink,
{
    invites: I,
    users: U,
    audit: A,
}

impl<I, U, A> AcceptInviteAction<I, U, A>
where
    I: InviteRepository,
    U: UserDirectory,
    A: AuditSink,
{
    pub fn new(invites: I, users: U, audit: A) -> Self {
        Self {
            invites,
            users,
            audit,
        }
    }

    /// Accepts the invitation carried by `token` as `actor_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(accepted)` - Actor joined the workspace with the invite's role
    /// - `Err(AccessError::NotFound)` - No invite matches the token
    /// - `Err(AccessError::InviteAlreadyAccepted)` - Single-use token spent
    /// - `Err(AccessError::InviteExpired)` - Past `expires_at`
    /// - `Err(AccessError::EmailMismatch)` - Invite bound to another identity
    /// - `Err(AccessError::AlreadyMember)` - Actor already belongs to the workspace
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "accept_invite", skip_all, err)
    )]
    pub async fn execute(
        &self,
        token: &SecretString,
        actor_id: i64,
    ) -> Result<AcceptedInvite, AccessError> {
        let token_hash = hash_token(token.expose_secret());

        let invite = self
            .invites
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(AccessError::NotFound)?;

        if invite.is_accepted() {
            return Err(AccessError::InviteAlreadyAccepted);
        }

        // lazy expiry: evaluated here, never swept in the background
        if invite.is_expired() {
            return Err(AccessError::InviteExpired);
        }

        let user = self
            .users
            .find_by_id(actor_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        // the invite is bound to one identity; exact match only
        if invite.email != user.email {
            return Err(AccessError::EmailMismatch);
        }

        let (invite, membership) = self.invites.accept(invite.id, actor_id).await?;

        log::info!(
            target: "palisade",
            "msg=\"invite accepted\", workspace_id={}, invite_id={}, user_id={}",
            membership.workspace_id,
            invite.id,
            actor_id
        );

        self.audit
            .record(
                AuditEvent::new(actor_id, "workspace.invite.accepted", "invite")
                    .workspace(membership.workspace_id)
                    .entity_id(invite.id),
            )
            .await;

        Ok(AcceptedInvite {
            workspace_id: membership.workspace_id,
            membership,
        })
    }
}
