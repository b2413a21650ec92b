//! Domain event abstractions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Trait that all domain events implement.
///
/// Events are plain values. The store stamps them with a timestamp and a
/// sequence number when they are appended, producing a [`RecordedEvent`].
pub trait DomainEvent: Send + Sync + Clone + std::fmt::Debug + 'static {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Returns the stream (aggregate) this event belongs to.
    fn stream_id(&self) -> Uuid;

    /// Whether this event initializes its aggregate.
    fn is_creation(&self) -> bool {
        false
    }

    /// Serializes the variant payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be represented as JSON.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Rebuilds an event from its type tag and payload.
    ///
    /// Returns `Ok(None)` when `event_type` is not a type this event knows.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error if the type is known but the payload
    /// does not match it.
    fn from_payload(
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error>
    where
        Self: Sized;
}

/// An event that has been stamped and made durable by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent<E> {
    /// Stream this event belongs to.
    pub stream_id: Uuid,
    /// Position within the stream, starting at 1.
    pub sequence_number: i64,
    /// Timestamp assigned by the store at append time.
    pub created_at: DateTime<Utc>,
    /// The domain event itself.
    pub event: E,
}
