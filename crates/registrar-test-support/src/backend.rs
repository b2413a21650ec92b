//! Test backends — mock `EventBackend` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registrar_core::backend::EventBackend;
use registrar_core::error::StoreError;
use registrar_core::record::{EventRecord, ProjectionRecord, event_partition_key, sort_key};
use registrar_core::stream::EventStream;
use registrar_event_store::memory::InMemoryBackend;
use uuid::Uuid;

/// A backend that always returns an unavailability error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingBackend;

#[async_trait]
impl EventBackend for FailingBackend {
    async fn put_durable_pair(
        &self,
        _stream_id: Uuid,
        _expected_version: i64,
        _event: &EventRecord,
        _projection: &ProjectionRecord,
    ) -> Result<(), StoreError> {
        Err(StoreError::BackendUnavailable("connection refused".into()))
    }

    async fn get_projection_record(
        &self,
        _stream_id: Uuid,
    ) -> Result<Option<ProjectionRecord>, StoreError> {
        Err(StoreError::BackendUnavailable("connection refused".into()))
    }

    async fn get_stream_records(&self, _stream_id: Uuid) -> Result<Vec<EventRecord>, StoreError> {
        Err(StoreError::BackendUnavailable("connection refused".into()))
    }
}

/// An `InMemoryBackend` wrapper whose faults can be switched on per test.
///
/// Supports failing reads or writes, rejecting the next N pair writes as
/// concurrent modifications, suspending pair writes before they reach
/// storage, planting raw event records the store never wrote, and overriding
/// the projection record returned to readers.
#[derive(Debug, Default)]
pub struct FaultInjectingBackend {
    inner: InMemoryBackend,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    pending_conflicts: AtomicU32,
    yield_before_write: AtomicBool,
    stall_writes: AtomicBool,
    write_attempts: AtomicU32,
    planted: Mutex<Vec<EventRecord>>,
    projection_override: Mutex<Option<ProjectionRecord>>,
}

impl FaultInjectingBackend {
    /// Create a backend with no faults enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every pair write fail with `BackendUnavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every read fail with `BackendUnavailable`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Reject the next `count` pair writes with `ConcurrentModification`.
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Yield to the scheduler once at the start of every pair write, so
    /// concurrent appends can interleave between their read and their write.
    pub fn set_yield_before_write(&self, enabled: bool) {
        self.yield_before_write.store(enabled, Ordering::SeqCst);
    }

    /// Make pair writes wait forever before touching storage. Only a dropped
    /// future gets out.
    pub fn set_stall_writes(&self, stall: bool) {
        self.stall_writes.store(stall, Ordering::SeqCst);
    }

    /// Number of pair writes attempted so far, including rejected ones.
    #[must_use]
    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Add a raw event record to `stream_id` without touching its projection.
    /// The record takes the next sequence number after everything stored.
    ///
    /// # Panics
    ///
    /// Panics if the inner backend cannot be read or the internal mutex is
    /// poisoned.
    pub async fn plant_record(
        &self,
        stream_id: Uuid,
        event_type: &str,
        payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) {
        let stored = self.inner.get_stream_records(stream_id).await.unwrap();
        let mut planted = self.planted.lock().unwrap();
        let sequence_number = i64::try_from(stored.len() + planted.len()).unwrap() + 1;
        planted.push(EventRecord {
            pk: event_partition_key(stream_id),
            sk: sort_key(created_at),
            stream_id,
            sequence_number,
            event_type: event_type.to_owned(),
            payload,
            created_at,
        });
    }

    /// Replace the projection record returned by `get_projection_record`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn override_projection(&self, projection: Option<ProjectionRecord>) {
        *self.projection_override.lock().unwrap() = projection;
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::BackendUnavailable("connection refused".into()));
        }
        Ok(())
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl EventBackend for FaultInjectingBackend {
    async fn put_durable_pair(
        &self,
        stream_id: Uuid,
        expected_version: i64,
        event: &EventRecord,
        projection: &ProjectionRecord,
    ) -> Result<(), StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.yield_before_write.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::BackendUnavailable("connection refused".into()));
        }
        if self.take_conflict() {
            return Err(StoreError::ConcurrentModification {
                stream_id,
                expected: expected_version,
                actual: expected_version + 1,
            });
        }
        self.inner
            .put_durable_pair(stream_id, expected_version, event, projection)
            .await
    }

    async fn get_projection_record(
        &self,
        stream_id: Uuid,
    ) -> Result<Option<ProjectionRecord>, StoreError> {
        self.check_reads()?;
        let overridden = self.projection_override.lock().unwrap().clone();
        if overridden.is_some() {
            return Ok(overridden);
        }
        self.inner.get_projection_record(stream_id).await
    }

    async fn get_stream_records(&self, stream_id: Uuid) -> Result<Vec<EventRecord>, StoreError> {
        self.check_reads()?;
        let records = self.inner.get_stream_records(stream_id).await?;
        let mut stream = EventStream::from_records(stream_id, records);
        for planted in self.planted.lock().unwrap().iter() {
            if planted.stream_id == stream_id {
                stream.append_to_stream(planted.clone());
            }
        }
        Ok(stream.into_records())
    }
}
