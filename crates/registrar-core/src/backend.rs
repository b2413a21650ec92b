//! Storage backend abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{EventRecord, ProjectionRecord};

/// Durable storage for event and projection records.
///
/// Implementations own connectivity to their storage engine. Errors are
/// returned to the store's caller unchanged.
#[async_trait]
pub trait EventBackend: Send + Sync {
    /// Writes an event record and the stream's updated projection record as
    /// one unit: either both become durable or neither does.
    ///
    /// The write is conditional on the stored projection still being at
    /// `expected_version` (`0` for a stream with no projection yet). If it
    /// has moved on, nothing is written and
    /// `StoreError::ConcurrentModification` is returned.
    async fn put_durable_pair(
        &self,
        stream_id: Uuid,
        expected_version: i64,
        event: &EventRecord,
        projection: &ProjectionRecord,
    ) -> Result<(), StoreError>;

    /// Loads the projection record of a stream, if one exists.
    async fn get_projection_record(
        &self,
        stream_id: Uuid,
    ) -> Result<Option<ProjectionRecord>, StoreError>;

    /// Loads all event records of a stream, ordered by creation timestamp and
    /// then by sequence number.
    async fn get_stream_records(&self, stream_id: Uuid) -> Result<Vec<EventRecord>, StoreError>;
}
