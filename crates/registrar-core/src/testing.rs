//! Minimal aggregate and event used by this crate's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::backend::EventBackend;
use crate::clock::Clock;
use crate::error::StoreError;
use crate::event::DomainEvent;
use crate::record::{EventRecord, ProjectionRecord, event_partition_key, sort_key};
use crate::stream::EventStream;

pub(crate) const TALLY_STREAM: Uuid = Uuid::from_u128(0x0a11_0000_0000_0000_0000_0000_0000_0001);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum TallyEvent {
    Opened { name: String },
    Added { name: String, amount: i64 },
}

impl TallyEvent {
    pub(crate) fn opened(name: &str) -> Self {
        Self::Opened {
            name: name.to_owned(),
        }
    }

    pub(crate) fn added(name: &str, amount: i64) -> Self {
        Self::Added {
            name: name.to_owned(),
            amount,
        }
    }
}

impl DomainEvent for TallyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "tally.opened",
            Self::Added { .. } => "tally.added",
        }
    }

    fn stream_id(&self) -> Uuid {
        TALLY_STREAM
    }

    fn is_creation(&self) -> bool {
        matches!(self, Self::Opened { .. })
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn from_payload(
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        match event_type {
            "tally.opened" | "tally.added" => serde_json::from_value(payload).map(Some),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Tally {
    pub name: String,
    pub total: i64,
    pub opened: bool,
}

impl Aggregate for Tally {
    type Event = TallyEvent;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            TallyEvent::Opened { name } => {
                self.name.clone_from(name);
                self.total = 0;
                self.opened = true;
            }
            TallyEvent::Added { amount, .. } => self.total += amount,
        }
    }

    fn is_created(&self) -> bool {
        self.opened
    }
}

/// Clock returning scripted instants, repeating the last one when exhausted.
pub(crate) struct ScriptedClock {
    instants: Mutex<Vec<DateTime<Utc>>>,
}

impl ScriptedClock {
    pub(crate) fn constant(instant: DateTime<Utc>) -> Self {
        Self::sequence(vec![instant])
    }

    pub(crate) fn sequence(mut instants: Vec<DateTime<Utc>>) -> Self {
        instants.reverse();
        Self {
            instants: Mutex::new(instants),
        }
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Utc> {
        let mut instants = self.instants.lock().unwrap();
        if instants.len() > 1 {
            instants.pop().unwrap()
        } else {
            instants[0]
        }
    }
}

#[derive(Default)]
struct Tables {
    streams: HashMap<Uuid, EventStream>,
    projections: HashMap<Uuid, ProjectionRecord>,
}

/// Bare in-memory backend with the conditional-write contract.
#[derive(Default)]
pub(crate) struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    /// Adds a raw record behind the store's back, leaving the projection alone.
    pub(crate) fn inject_record(&self, stream_id: Uuid, event_type: &str, created_at: DateTime<Utc>) {
        let mut tables = self.tables.lock().unwrap();
        let stream = tables
            .streams
            .entry(stream_id)
            .or_insert_with(|| EventStream::new(stream_id));
        let sequence_number = stream.last_sequence_number() + 1;
        stream.append_to_stream(EventRecord {
            pk: event_partition_key(stream_id),
            sk: sort_key(created_at),
            stream_id,
            sequence_number,
            event_type: event_type.to_owned(),
            payload: serde_json::json!({}),
            created_at,
        });
    }
}

#[async_trait]
impl EventBackend for MemoryBackend {
    async fn put_durable_pair(
        &self,
        stream_id: Uuid,
        expected_version: i64,
        event: &EventRecord,
        projection: &ProjectionRecord,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let actual = tables.projections.get(&stream_id).map_or(0, |p| p.version);
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
        tables.projections.insert(stream_id, projection.clone());
        Ok(())
    }

    async fn get_projection_record(
        &self,
        stream_id: Uuid,
    ) -> Result<Option<ProjectionRecord>, StoreError> {
        Ok(self.tables.lock().unwrap().projections.get(&stream_id).cloned())
    }

    async fn get_stream_records(&self, stream_id: Uuid) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .streams
            .get(&stream_id)
            .map(|s| s.replay().to_vec())
            .unwrap_or_default())
    }
}
