//! In-memory implementation of the `EventBackend` trait.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use registrar_core::backend::EventBackend;
use registrar_core::error::StoreError;
use registrar_core::record::{EventRecord, ProjectionRecord};
use registrar_core::stream::EventStream;

#[derive(Debug, Default)]
struct Tables {
    streams: HashMap<Uuid, EventStream>,
    projections: HashMap<String, ProjectionRecord>,
}

/// Event streams and projection records held in process memory.
///
/// Both halves of a pair are written under one lock with no suspension
/// point, so a pair write is all-or-nothing even if the caller's future is
/// dropped.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::BackendUnavailable("in-memory backend lock poisoned".into()))
    }
}

#[async_trait]
impl EventBackend for InMemoryBackend {
    #[tracing::instrument(skip(self, event, projection), fields(sequence_number = event.sequence_number))]
    async fn put_durable_pair(
        &self,
        stream_id: Uuid,
        expected_version: i64,
        event: &EventRecord,
        projection: &ProjectionRecord,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;

        let actual = tables
            .projections
            .get(&projection.pk)
            .map_or(0, |p| p.version);
        if actual != expected_version {
            return Err(StoreError::ConcurrentModification {
                stream_id,
                expected: expected_version,
                actual,
            });
        }

        tables
            .streams
            .entry(stream_id)
            .or_insert_with(|| EventStream::new(stream_id))
            .append_to_stream(event.clone());
        tables
            .projections
            .insert(projection.pk.clone(), projection.clone());

        tracing::debug!("event and projection stored");
        Ok(())
    }

    async fn get_projection_record(
        &self,
        stream_id: Uuid,
    ) -> Result<Option<ProjectionRecord>, StoreError> {
        let key = registrar_core::record::projection_partition_key(stream_id);
        Ok(self.tables()?.projections.get(&key).cloned())
    }

    async fn get_stream_records(&self, stream_id: Uuid) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self
            .tables()?
            .streams
            .get(&stream_id)
            .map(|stream| stream.replay().to_vec())
            .unwrap_or_default())
    }
}
