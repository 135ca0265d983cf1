//! Audit events for account lifecycle operations.
//!
//! Every mutation the engine performs on behalf of a session produces an
//! [`AuditEvent`]. Events record the acting session, the affected account
//! or group, the outcome, and free-form details such as the new uidNumber.
//! Secrets never appear in events.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Session events
    /// Session bound and profile loaded.
    SessionOpened,
    /// Session bind refused.
    SessionRejected,

    // Account events
    /// Account created.
    AccountCreated,
    /// Account renamed, all steps completed.
    AccountRenamed,
    /// Rename stopped after mutating the directory.
    RenameInterrupted,
    /// Interrupted rename completed by a resume pass.
    RenameResumed,

    // Membership events
    /// Account added to a group-like entry.
    MembershipAdded,
    /// Account removed from a group-like entry.
    MembershipRemoved,
    /// References moved from one uid to another.
    ReferencesRedirected,
    /// Reference sweep stopped after mutating the directory.
    RedirectInterrupted,
    /// Interrupted reference sweep completed by a resume pass.
    RedirectResumed,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// An audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// uid of the session that performed the operation.
    pub actor: Option<String>,

    /// DN or uid the operation targeted.
    pub subject: Option<String>,

    /// Error message (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl AuditEvent {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type)
    }

    /// Looks up a detail value by key.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for creating events.
pub struct AuditEventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    actor: Option<String>,
    subject: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl AuditEventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            actor: None,
            subject: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the acting session uid.
    #[must_use]
    pub fn actor(mut self, uid: impl Into<String>) -> Self {
        self.actor = Some(uid.into());
        self
    }

    /// Sets the affected DN or uid.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.details.push((key.into(), value.to_string()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> AuditEvent {
        AuditEvent {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            actor: self.actor,
            subject: self.subject,
            error: self.error,
            details: self.details,
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Records an event. Sinks must not fail the calling operation.
    fn record(&self, event: AuditEvent);
}

/// Sink that writes events to the tracing framework at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            event_id = %event.id,
            event_type = ?event.event_type,
            outcome = ?event.outcome,
            actor = ?event.actor,
            subject = ?event.subject,
            error = ?event.error,
            details = ?event.details,
            "audit_event"
        );
    }
}

/// In-memory sink for testing.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns recorded events of one type.
    #[must_use]
    pub fn events_of(&self, event_type: EventType) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}
