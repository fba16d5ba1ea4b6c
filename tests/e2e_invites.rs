//! End-to-end tests for the invitation lifecycle.
//!
//! Run with: `cargo test --features mocks --test e2e_invites`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, Utc};

use palisade::actions::{
    AcceptInviteAction, CancelInviteAction, CreateWorkspaceAction, InviteMemberAction,
    InviteMemberInput, ListInvitesAction, PreviewInviteAction,
};
use palisade::audit::NullAuditSink;
use palisade::crypto::hash_token;
use palisade::memory::MemoryStore;
use palisade::notify::{NullNotifier, RecordingNotifier};
use palisade::repository::{CreateInvite, InviteRepository};
use palisade::{AccessError, Role, SecretString};

struct Fixture {
    store: MemoryStore,
    owner_id: i64,
    workspace_id: i64,
}

async fn setup() -> Fixture {
    let store = MemoryStore::new();
    let owner = store.add_user("owner@x.com", "Owner").unwrap();
    let created = CreateWorkspaceAction::new(store.clone(), store.clone(), NullAuditSink)
        .execute(owner.id, "Acme")
        .await
        .unwrap();
    Fixture {
        store,
        owner_id: owner.id,
        workspace_id: created.workspace.id,
    }
}

fn invite_action(
    store: &MemoryStore,
) -> InviteMemberAction<MemoryStore, MemoryStore, MemoryStore, MemoryStore, NullNotifier, NullAuditSink>
{
    InviteMemberAction::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        NullNotifier,
        NullAuditSink,
    )
}

fn input(f: &Fixture, email: &str, role: Role) -> InviteMemberInput {
    InviteMemberInput {
        workspace_id: f.workspace_id,
        actor_id: f.owner_id,
        email: email.to_owned(),
        role,
    }
}

#[tokio::test]
async fn test_invite_cancel_and_reinvite() {
    let f = setup().await;
    let action = invite_action(&f.store);

    let first = action
        .execute(input(&f, "b@x.com", Role::Member))
        .await
        .unwrap();

    // duplicate invite is blocked while the first is pending
    assert_eq!(
        action
            .execute(input(&f, "b@x.com", Role::Member))
            .await
            .unwrap_err(),
        AccessError::AlreadyInvited
    );

    // cancel frees the email for a fresh invite with a different role
    CancelInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink)
        .execute(f.workspace_id, first.invite.id, f.owner_id)
        .await
        .unwrap();
    let second = action
        .execute(input(&f, "b@x.com", Role::Admin))
        .await
        .unwrap();
    assert_eq!(second.invite.role, Role::Admin);

    // the canceled token no longer works
    let accept = AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink);
    let invitee = f.store.add_user("b@x.com", "B").unwrap();
    assert_eq!(
        accept.execute(&first.token, invitee.id).await.unwrap_err(),
        AccessError::NotFound
    );
    accept.execute(&second.token, invitee.id).await.unwrap();
}

#[tokio::test]
async fn test_listing_shows_only_pending() {
    let f = setup().await;
    let action = invite_action(&f.store);

    let kept = action
        .execute(input(&f, "kept@x.com", Role::Member))
        .await
        .unwrap();
    let accepted = action
        .execute(input(&f, "accepted@x.com", Role::Member))
        .await
        .unwrap();

    // expired invite written directly against the store
    InviteRepository::create(
        &f.store,
        CreateInvite {
            workspace_id: f.workspace_id,
            email: "expired@x.com".to_owned(),
            role: Role::Member,
            token_hash: hash_token("expired-token"),
            invited_by: f.owner_id,
            expires_at: Utc::now() - Duration::hours(1),
        },
    )
    .await
    .unwrap();

    let invitee = f.store.add_user("accepted@x.com", "B").unwrap();
    AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink)
        .execute(&accepted.token, invitee.id)
        .await
        .unwrap();

    let invites = ListInvitesAction::new(f.store.clone(), f.store.clone())
        .execute(f.workspace_id, f.owner_id)
        .await
        .unwrap();

    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].id, kept.invite.id);
}

#[tokio::test]
async fn test_preview_then_accept_flow() {
    let f = setup().await;
    let output = invite_action(&f.store)
        .execute(input(&f, "b@x.com", Role::Viewer))
        .await
        .unwrap();

    let preview = PreviewInviteAction::new(f.store.clone(), f.store.clone(), f.store.clone())
        .execute(&output.token)
        .await
        .unwrap();
    assert_eq!(preview.workspace_name, "Acme");
    assert_eq!(preview.email, "b@x.com");
    assert_eq!(preview.role, Role::Viewer);
    assert_eq!(preview.inviter_name, "Owner");

    let invitee = f.store.add_user("b@x.com", "B").unwrap();
    let accepted = AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink)
        .execute(&output.token, invitee.id)
        .await
        .unwrap();
    assert_eq!(accepted.membership.role, Role::Viewer);

    // spent invites no longer preview
    let result = PreviewInviteAction::new(f.store.clone(), f.store.clone(), f.store.clone())
        .execute(&output.token)
        .await;
    assert_eq!(result.unwrap_err(), AccessError::InviteAlreadyAccepted);
}

#[tokio::test]
async fn test_invite_bound_to_exact_email() {
    let f = setup().await;
    let output = invite_action(&f.store)
        .execute(input(&f, "b@x.com", Role::Member))
        .await
        .unwrap();

    let accept = AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink);

    // wrong identity, then wrong case, then the bound one
    let wrong = f.store.add_user("c@x.com", "C").unwrap();
    assert_eq!(
        accept.execute(&output.token, wrong.id).await.unwrap_err(),
        AccessError::EmailMismatch
    );
    let cased = f.store.add_user("B@x.com", "B upper").unwrap();
    assert_eq!(
        accept.execute(&output.token, cased.id).await.unwrap_err(),
        AccessError::EmailMismatch
    );
    let bound = f.store.add_user("b@x.com", "B").unwrap();
    accept.execute(&output.token, bound.id).await.unwrap();
}

#[tokio::test]
async fn test_expired_invite_rejected_lazily() {
    let f = setup().await;
    let token = "expired-token-value";
    InviteRepository::create(
        &f.store,
        CreateInvite {
            workspace_id: f.workspace_id,
            email: "b@x.com".to_owned(),
            role: Role::Member,
            token_hash: hash_token(token),
            invited_by: f.owner_id,
            expires_at: Utc::now() - Duration::minutes(1),
        },
    )
    .await
    .unwrap();
    let invitee = f.store.add_user("b@x.com", "B").unwrap();

    let result = AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink)
        .execute(&SecretString::new(token), invitee.id)
        .await;
    assert_eq!(result.unwrap_err(), AccessError::InviteExpired);

    let preview = PreviewInviteAction::new(f.store.clone(), f.store.clone(), f.store.clone())
        .execute(&SecretString::new(token))
        .await;
    assert_eq!(preview.unwrap_err(), AccessError::InviteExpired);
}

#[tokio::test]
async fn test_concurrent_accepts_create_one_membership() {
    let f = setup().await;
    let output = invite_action(&f.store)
        .execute(input(&f, "b@x.com", Role::Member))
        .await
        .unwrap();
    let invitee = f.store.add_user("b@x.com", "B").unwrap();

    let accept_a = AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink);
    let accept_b = AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink);
    let (first, second) = tokio::join!(
        accept_a.execute(&output.token, invitee.id),
        accept_b.execute(&output.token, invitee.id)
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(AccessError::InviteAlreadyAccepted | AccessError::AlreadyMember)
    )));

    use palisade::repository::MembershipRepository;
    let members = f.store.find_by_workspace(f.workspace_id).await.unwrap();
    assert_eq!(members.iter().filter(|m| m.user_id == invitee.id).count(), 1);
}

#[tokio::test]
async fn test_bounced_notification_keeps_invite_sharable() {
    let f = setup().await;
    let action = InviteMemberAction::new(
        f.store.clone(),
        f.store.clone(),
        f.store.clone(),
        f.store.clone(),
        RecordingNotifier::failing(),
        NullAuditSink,
    );

    let output = action
        .execute(input(&f, "b@x.com", Role::Member))
        .await
        .unwrap();

    // the token from the response still joins the workspace
    let invitee = f.store.add_user("b@x.com", "B").unwrap();
    AcceptInviteAction::new(f.store.clone(), f.store.clone(), NullAuditSink)
        .execute(&output.token, invitee.id)
        .await
        .unwrap();
}
