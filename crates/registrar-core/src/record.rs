//! Storable record shapes and the codec between them and domain values.
//!
//! Every record carries a partition key (`pk`) and a sort key (`sk`). Event
//! records live in the partition named after their stream and sort by their
//! creation timestamp. The projection of a stream is a single record whose
//! partition and sort keys are both `"{stream_id}_view"`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::error::StoreError;
use crate::event::{DomainEvent, RecordedEvent};

/// Suffix appended to a stream id to name its projection record.
pub const PROJECTION_SUFFIX: &str = "_view";

/// Partition key of the event records of `stream_id`.
#[must_use]
pub fn event_partition_key(stream_id: Uuid) -> String {
    stream_id.to_string()
}

/// Partition (and sort) key of the projection record of `stream_id`.
#[must_use]
pub fn projection_partition_key(stream_id: Uuid) -> String {
    format!("{stream_id}{PROJECTION_SUFFIX}")
}

/// ISO-8601 sort key for an event timestamp.
///
/// Fixed nanosecond precision in UTC, so lexicographic order is
/// chronological order.
#[must_use]
pub fn sort_key(created_at: DateTime<Utc>) -> String {
    created_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Stored representation of a single event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Partition key: the stream id.
    pub pk: String,
    /// Sort key: the ISO-8601 creation timestamp.
    pub sk: String,
    /// Stream this event belongs to.
    pub stream_id: Uuid,
    /// Insertion sequence within the stream, starting at 1.
    pub sequence_number: i64,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Timestamp assigned by the store.
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Replay ordering key: timestamp first, insertion sequence on ties.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.sequence_number)
    }
}

/// Stored representation of a stream's materialized view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    /// Partition key: `"{stream_id}_view"`.
    pub pk: String,
    /// Sort key: same as the partition key.
    pub sk: String,
    /// Stream this projection materializes.
    pub stream_id: Uuid,
    /// Number of events folded into `state`.
    pub version: i64,
    /// Serialized aggregate state.
    pub state: serde_json::Value,
    /// Creation timestamp of the last folded event.
    pub updated_at: DateTime<Utc>,
}

/// Encodes a recorded event into its storable form.
///
/// # Errors
///
/// Returns `StoreError::MalformedRecord` if the payload cannot be serialized.
pub fn encode_event<E: DomainEvent>(recorded: &RecordedEvent<E>) -> Result<EventRecord, StoreError> {
    let payload = recorded
        .event
        .to_payload()
        .map_err(|e| StoreError::MalformedRecord {
            stream_id: recorded.stream_id,
            reason: format!("event serialization failed: {e}"),
        })?;
    Ok(EventRecord {
        pk: event_partition_key(recorded.stream_id),
        sk: sort_key(recorded.created_at),
        stream_id: recorded.stream_id,
        sequence_number: recorded.sequence_number,
        event_type: recorded.event.event_type().to_owned(),
        payload,
        created_at: recorded.created_at,
    })
}

/// Decodes a stored event. Returns `Ok(None)` for event types `E` does not know.
///
/// # Errors
///
/// Returns `StoreError::MalformedRecord` if the type is known but the payload
/// does not decode.
pub fn decode_event<E: DomainEvent>(
    record: &EventRecord,
) -> Result<Option<RecordedEvent<E>>, StoreError> {
    let event = E::from_payload(&record.event_type, record.payload.clone()).map_err(|e| {
        StoreError::MalformedRecord {
            stream_id: record.stream_id,
            reason: format!(
                "event {} ({}) deserialization failed: {e}",
                record.sequence_number, record.event_type
            ),
        }
    })?;
    Ok(event.map(|event| RecordedEvent {
        stream_id: record.stream_id,
        sequence_number: record.sequence_number,
        created_at: record.created_at,
        event,
    }))
}

/// Encodes an aggregate state as the projection record of `stream_id`.
///
/// # Errors
///
/// Returns `StoreError::MalformedRecord` if the state cannot be serialized.
pub fn encode_projection<A: Aggregate>(
    stream_id: Uuid,
    version: i64,
    updated_at: DateTime<Utc>,
    state: &A,
) -> Result<ProjectionRecord, StoreError> {
    let state = serde_json::to_value(state).map_err(|e| StoreError::MalformedRecord {
        stream_id,
        reason: format!("projection serialization failed: {e}"),
    })?;
    let key = projection_partition_key(stream_id);
    Ok(ProjectionRecord {
        pk: key.clone(),
        sk: key,
        stream_id,
        version,
        state,
        updated_at,
    })
}

/// Decodes the aggregate state held by a projection record.
///
/// # Errors
///
/// Returns `StoreError::MalformedRecord` if the state does not decode.
pub fn decode_projection<A: Aggregate>(record: &ProjectionRecord) -> Result<A, StoreError> {
    serde_json::from_value(record.state.clone()).map_err(|e| StoreError::MalformedRecord {
        stream_id: record.stream_id,
        reason: format!("projection deserialization failed: {e}"),
    })
}
