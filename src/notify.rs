//! Invite notification collaborator.
//!
//! Delivery is best-effort: an invite is valid and sharable by other
//! means the moment it is persisted, so the inviting action logs a
//! failed send and carries on. Implement [`InviteNotifier`] to hand the
//! payload to the host's mail pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::roles::Role;

/// Everything a notification template needs to render an invite email.
#[derive(Debug, Clone)]
pub struct InviteEmail {
    /// Recipient address (the invite's bound email).
    pub email: String,
    /// Display name of the workspace being joined.
    pub workspace_name: String,
    /// Role the invitee will receive on acceptance.
    pub role: Role,
    /// Join link with the plain token embedded as the final path segment.
    pub join_url: String,
    /// When the invite stops working.
    pub expires_at: DateTime<Utc>,
    /// Display name of the member who sent the invite.
    pub inviter_name: String,
}

/// Failure reported by a notifier; logged by the caller, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyError(pub String);

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotifyError {}

/// Delivers invite notifications.
#[async_trait]
pub trait InviteNotifier: Send + Sync {
    async fn send_invite(&self, invite: &InviteEmail) -> Result<(), NotifyError>;
}

#[async_trait]
impl<N: InviteNotifier + ?Sized> InviteNotifier for std::sync::Arc<N> {
    async fn send_invite(&self, invite: &InviteEmail) -> Result<(), NotifyError> {
        (**self).send_invite(invite).await
    }
}

/// Notifier that drops every message.
pub struct NullNotifier;

#[async_trait]
impl InviteNotifier for NullNotifier {
    async fn send_invite(&self, _invite: &InviteEmail) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier that captures sends for test assertions, optionally failing
/// every call to exercise the log-and-continue path.
#[cfg(feature = "mocks")]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<InviteEmail>>,
    pub fail: bool,
}

#[cfg(feature = "mocks")]
impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A notifier whose every send fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[cfg(feature = "mocks")]
impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "mocks")]
#[async_trait]
impl InviteNotifier for RecordingNotifier {
    async fn send_invite(&self, invite: &InviteEmail) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError("smtp unavailable".to_owned()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(invite.clone());
        }
        Ok(())
    }
}
