//! Domain events for downstream observers.
//!
//! Follow-up scheduling and analytics hang off these events. Delivery is
//! fire-and-forget: a sink failure never rolls back the committed write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use funnel::LeadStatus;

/// What happened to the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventKind {
    /// Lead created by intake
    Created,
    /// Lead moved through the funnel
    StatusChanged,
    /// Lead created by batch import
    Imported,
}

/// A committed lead change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadEvent {
    /// What happened
    pub kind: LeadEventKind,
    /// The lead
    pub lead_id: String,
    /// Status before the change (`None` for creation)
    pub from_status: Option<LeadStatus>,
    /// Status after the change
    pub to_status: LeadStatus,
    /// Actor who made the change
    pub actor_id: String,
    /// When the change committed
    pub timestamp: DateTime<Utc>,
}

impl LeadEvent {
    /// Event for a committed transition.
    pub fn status_changed(
        lead_id: impl Into<String>,
        from: LeadStatus,
        to: LeadStatus,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: LeadEventKind::StatusChanged,
            lead_id: lead_id.into(),
            from_status: Some(from),
            to_status: to,
            actor_id: actor_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Event for a created lead.
    pub fn created(
        lead_id: impl Into<String>,
        to: LeadStatus,
        actor_id: impl Into<String>,
        kind: LeadEventKind,
    ) -> Self {
        Self {
            kind,
            lead_id: lead_id.into(),
            from_status: None,
            to_status: to,
            actor_id: actor_id.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Failure from an event sink.
#[derive(Debug, Clone, thiserror::Error)]
#[error("event sink failure: {0}")]
pub struct EventSinkError(pub String);

/// Downstream event consumer.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    async fn publish(&self, event: LeadEvent) -> Result<(), EventSinkError>;
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn publish(&self, _event: LeadEvent) -> Result<(), EventSinkError> {
        Ok(())
    }
}

/// Sink that records events for inspection (tests, embedders).
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Arc<RwLock<Vec<LeadEvent>>>,
}

impl RecordingEventSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub async fn events(&self) -> Vec<LeadEvent> {
        self.events.read().await.clone()
    }

    /// Number of events published.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Whether nothing was published.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: LeadEvent) -> Result<(), EventSinkError> {
        self.events.write().await.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingEventSink::new();
        assert!(sink.is_empty().await);

        sink.publish(LeadEvent::status_changed(
            "lead-1",
            LeadStatus::New,
            LeadStatus::Callback,
            "actor-1",
        ))
        .await
        .unwrap();

        let events = sink.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, LeadEventKind::StatusChanged);
        assert_eq!(events[0].from_status, Some(LeadStatus::New));
        assert_eq!(events[0].to_status, LeadStatus::Callback);
    }

    #[test]
    fn test_event_serialization() {
        let event = LeadEvent::created("lead-1", LeadStatus::New, "actor-1", LeadEventKind::Created);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "created");
        assert!(json["fromStatus"].is_null());
        assert_eq!(json["toStatus"], "new");
    }
}
