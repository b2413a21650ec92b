//! Ordered, append-only event stream.

use uuid::Uuid;

use crate::record::EventRecord;

/// The records of one stream, kept in replay order.
///
/// Replay order is ascending creation timestamp; records sharing a timestamp
/// keep their insertion order (which is also their sequence order).
#[derive(Debug, Clone)]
pub struct EventStream {
    stream_id: Uuid,
    records: Vec<EventRecord>,
}

impl EventStream {
    /// Creates an empty stream.
    #[must_use]
    pub fn new(stream_id: Uuid) -> Self {
        Self {
            stream_id,
            records: Vec::new(),
        }
    }

    /// Builds a stream from records in any order.
    #[must_use]
    pub fn from_records(stream_id: Uuid, records: impl IntoIterator<Item = EventRecord>) -> Self {
        let mut records: Vec<EventRecord> = records.into_iter().collect();
        records.sort_by_key(EventRecord::order_key);
        Self { stream_id, records }
    }

    /// The stream this sequence belongs to.
    #[must_use]
    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    /// Inserts `record` at its replay position. Never removes or rewrites
    /// existing records.
    pub fn append_to_stream(&mut self, record: EventRecord) {
        let key = record.order_key();
        let index = self.records.partition_point(|r| r.order_key() <= key);
        self.records.insert(index, record);
    }

    /// All records in replay order.
    #[must_use]
    pub fn replay(&self) -> &[EventRecord] {
        &self.records
    }

    /// Consumes the stream, returning its records in replay order.
    #[must_use]
    pub fn into_records(self) -> Vec<EventRecord> {
        self.records
    }

    /// Highest sequence number in the stream, `0` when empty.
    #[must_use]
    pub fn last_sequence_number(&self) -> i64 {
        self.records
            .iter()
            .map(|r| r.sequence_number)
            .max()
            .unwrap_or(0)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the stream holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
