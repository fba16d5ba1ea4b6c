//! Fire-and-forget audit trail collaborator.
//!
//! Actions emit an [`AuditEvent`] after every successful mutation. Sinks
//! are infallible by construction: `record` returns nothing, so a broken
//! audit pipeline can never fail or roll back the operation that
//! triggered it. Implement [`AuditSink`] to forward events to the host's
//! audit store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audit trail entry describing a completed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// The user who performed the action.
    pub actor_id: i64,
    /// The workspace scope, when the action had one.
    pub workspace_id: Option<i64>,
    /// Dot-separated action name, e.g. `workspace.member.removed`.
    pub action: &'static str,
    /// The kind of entity acted on, e.g. `membership`.
    pub entity: &'static str,
    /// The acted-on entity's id, when one exists after the action.
    pub entity_id: Option<i64>,
    /// Optional JSON payload with action-specific details.
    pub metadata: Option<String>,
    /// When the action completed.
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    #[must_use]
    pub fn new(actor_id: i64, action: &'static str, entity: &'static str) -> Self {
        Self {
            actor_id,
            workspace_id: None,
            action,
            entity,
            entity_id: None,
            metadata: None,
            at: Utc::now(),
        }
    }

    #[must_use]
    pub fn workspace(mut self, workspace_id: i64) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: i64) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

/// Receives audit events from actions.
///
/// Handlers must swallow their own failures; there is no error channel
/// back into the triggering operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

#[async_trait]
impl<S: AuditSink + ?Sized> AuditSink for std::sync::Arc<S> {
    async fn record(&self, event: AuditEvent) {
        (**self).record(event).await;
    }
}

/// Sink that writes events to the `log` facade.
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, event: AuditEvent) {
        log::info!(
            target: "palisade",
            "msg=\"audit\", action=\"{}\", actor_id={}, workspace_id={}, entity=\"{}\", entity_id={}",
            event.action,
            event.actor_id,
            event.workspace_id.map_or_else(|| "-".to_owned(), |id| id.to_string()),
            event.entity,
            event.entity_id.map_or_else(|| "-".to_owned(), |id| id.to_string()),
        );
    }
}

/// Sink that discards every event.
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _event: AuditEvent) {}
}

/// Sink that captures events for test assertions.
#[cfg(feature = "mocks")]
pub struct RecordingAuditSink {
    pub events: std::sync::Mutex<Vec<AuditEvent>>,
}

#[cfg(feature = "mocks")]
impl RecordingAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Names of the recorded actions, in order.
    #[must_use]
    pub fn actions(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|events| events.iter().map(|e| e.action).collect())
            .unwrap_or_default()
    }
}

#[cfg(feature = "mocks")]
impl Default for RecordingAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "mocks")]
#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sink_captures_events() {
        let sink = RecordingAuditSink::new();

        sink.record(
            AuditEvent::new(1, "workspace.created", "workspace")
                .workspace(7)
                .entity_id(7),
        )
        .await;
        sink.record(AuditEvent::new(1, "workspace.renamed", "workspace").workspace(7))
            .await;

        assert_eq!(sink.actions(), vec!["workspace.created", "workspace.renamed"]);
        let events = sink.events.lock().unwrap();
        assert_eq!(events[0].workspace_id, Some(7));
        assert_eq!(events[0].entity_id, Some(7));
    }
}
