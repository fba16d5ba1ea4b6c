use chrono::{Duration, Utc};

use crate::actions::{membership_or_forbidden, require_managerial};
use crate::audit::{AuditEvent, AuditSink};
use crate::config::InviteConfig;
use crate::crypto::{generate_token, hash_token, SecretString};
use crate::notify::{InviteEmail, InviteNotifier};
use crate::repository::{
    CreateInvite, InviteRepository, MembershipRepository, UserDirectory, WorkspaceRepository,
};
use crate::roles::Role;
use crate::types::WorkspaceInvite;
use crate::validators::validate_email;
use crate::AccessError;

/// Input data for inviting a user into a workspace.
#[derive(Debug, Clone)]
pub struct InviteMemberInput {
    pub workspace_id: i64,
    pub actor_id: i64,
    pub email: String,
    pub role: Role,
}

/// Output from inviting a user.
#[derive(Debug)]
pub struct InviteMemberOutput {
    /// The created invitation record.
    pub invite: WorkspaceInvite,
    /// The plain token for the join link (not stored, only returned once).
    pub token: SecretString,
}

/// Action to invite a user into a workspace by email.
///
/// This action:
/// 1. Requires the actor to be Owner or Admin
/// 2. Rejects emails that already hold a membership or a pending invite
/// 3. Generates an unguessable token, stores only its hash, and sets the
///    configured expiry
/// 4. Hands the join link to the notifier — delivery is best-effort and a
///    failed send never rolls the invite back
pub struct InviteMemberAction<W, M, I, U, N, A>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    I: InviteRepository,
    U: UserDirectory,
    N: InviteNotifier,
    A: AuditSink,
{
    workspaces: W,
    memberships: M,
    invites: I,
    users: U,
    notifier: N,
    audit: A,
    config: InviteConfig,
}

impl<W, M, I, U, N, A> InviteMemberAction<W, M, I, U, N, A>
where
    W: WorkspaceRepository,
    M: MembershipRepository,
    I: InviteRepository,
    U: UserDirectory,
    N: InviteNotifier,
    A: AuditSink,
{
    /// Creates a new `InviteMemberAction` with default configuration.
    pub fn new(workspaces: W, memberships: M, invites: I, users: U, notifier: N, audit: A) -> Self {
        Self::with_config(
            workspaces,
            memberships,
            invites,
            users,
            notifier,
            audit,
            InviteConfig::default(),
        )
    }

    /// Creates a new `InviteMemberAction` with custom configuration.
    pub fn with_config(
        workspaces: W,
        memberships: M,
        invites: I,
        users: U,
        notifier: N,
        audit: A,
        config: InviteConfig,
    ) -> Self {
        Self {
            workspaces,
            memberships,
            invites,
            users,
            notifier,
            audit,
            config,
        }
    }

    /// Creates a pending invitation and notifies the invitee.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - Invite created, plain token attached for delivery
    /// - `Err(AccessError::Forbidden)` - Actor below Admin
    /// - `Err(AccessError::OwnerRoleImmutable)` - Proposed role is Owner
    /// - `Err(AccessError::AlreadyMember)` - Email already belongs to a member
    /// - `Err(AccessError::AlreadyInvited)` - A pending invite for the email exists
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "invite_member", skip_all, err)
    )]
    pub async fn execute(
        &self,
        input: InviteMemberInput,
    ) -> Result<InviteMemberOutput, AccessError> {
        let actor =
            membership_or_forbidden(&self.memberships, input.workspace_id, input.actor_id).await?;
        require_managerial(&actor)?;

        if input.role == Role::Owner {
            return Err(AccessError::OwnerRoleImmutable);
        }

        validate_email(&input.email)?;

        let workspace = self
            .workspaces
            .find_by_id(input.workspace_id)
            .await?
            .ok_or(AccessError::NotFound)?;

        if let Some(existing) = self.users.find_by_email(&input.email).await? {
            if self
                .memberships
                .find_by_workspace_and_user(input.workspace_id, existing.id)
                .await?
                .is_some()
            {
                return Err(AccessError::AlreadyMember);
            }
        }

        if self
            .invites
            .has_pending(input.workspace_id, &input.email)
            .await?
        {
            return Err(AccessError::AlreadyInvited);
        }

        let token = generate_token(self.config.token_length);
        let token_hash = hash_token(&token);
        let expires_at = Utc::now() + Duration::days(self.config.expiry_days);

        let invite = self
            .invites
            .create(CreateInvite {
                workspace_id: input.workspace_id,
                email: input.email.clone(),
                role: input.role,
                token_hash,
                invited_by: input.actor_id,
                expires_at,
            })
            .await?;

        log::info!(
            target: "palisade",
            "msg=\"invite created\", workspace_id={}, invite_id={}, email=\"{}\", role=\"{}\"",
            invite.workspace_id,
            invite.id,
            invite.email,
            invite.role.as_str()
        );

        let inviter_name = self
            .users
            .find_by_id(input.actor_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();

        // delivery is best-effort; the invite stands even if the email bounces
        let email = InviteEmail {
            email: invite.email.clone(),
            workspace_name: workspace.name,
            role: invite.role,
            join_url: self.config.join_link(&token),
            expires_at: invite.expires_at,
            inviter_name,
        };
        if let Err(err) = self.notifier.send_invite(&email).await {
            log::warn!(
                target: "palisade",
                "msg=\"invite notification failed\", invite_id={}, error=\"{err}\"",
                invite.id
            );
        }

        self.audit
            .record(
                AuditEvent::new(input.actor_id, "workspace.invite.created", "invite")
                    .workspace(input.workspace_id)
                    .entity_id(invite.id),
            )
            .await;

        Ok(InviteMemberOutput {
            invite,
            token: SecretString::new(token),
        })
    }
}
