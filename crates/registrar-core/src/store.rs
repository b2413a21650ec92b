//! The event store: append-with-fold, projection reads, and full replay.

use std::fmt;
use std::sync::Arc;

use chrono::SubsecRound;
use uuid::Uuid;

use crate::aggregate::{self, Aggregate};
use crate::backend::EventBackend;
use crate::cache::{CachedProjection, ProjectionCache};
use crate::clock::Clock;
use crate::config::{DuplicateCreationPolicy, ReplayMode, StoreConfig};
use crate::error::StoreError;
use crate::event::{DomainEvent, RecordedEvent};
use crate::record::{self, EventRecord};
use crate::stream::EventStream;

/// Result of a successful `append`.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome<E> {
    /// The event was stamped, persisted, and folded into the projection.
    Recorded(RecordedEvent<E>),
    /// A repeated creation event was dropped under
    /// `DuplicateCreationPolicy::Ignore`. Nothing was persisted.
    DuplicateCreationIgnored,
}

impl<E> AppendOutcome<E> {
    /// The recorded event, if one was persisted.
    #[must_use]
    pub fn recorded(&self) -> Option<&RecordedEvent<E>> {
        match self {
            Self::Recorded(recorded) => Some(recorded),
            Self::DuplicateCreationIgnored => None,
        }
    }
}

/// Outcome of comparing a stream's replayed state with its stored projection.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionCheck<A> {
    /// Replay and projection agree (including both being absent).
    Consistent,
    /// Replay and projection disagree.
    Diverged {
        /// State obtained by folding the stream.
        replayed: Option<A>,
        /// State held by the projection record.
        projected: Option<A>,
    },
}

impl<A> ProjectionCheck<A> {
    /// Whether the check found no divergence.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// Event-sourced store for aggregates of type `A`.
///
/// Every append writes the event and the stream's refolded projection as one
/// conditional pair, then refreshes the in-process cache. Reads either return
/// the projection (`get_projection`) or rebuild state from the stream
/// (`get_aggregate`).
pub struct EventStore<A: Aggregate> {
    backend: Arc<dyn EventBackend>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    cache: ProjectionCache<A>,
}

impl<A: Aggregate> fmt::Debug for EventStore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStore")
            .field("config", &self.config)
            .field("cached_streams", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl<A: Aggregate> EventStore<A> {
    /// Creates a store over `backend`, stamping events with `clock`.
    #[must_use]
    pub fn new(backend: Arc<dyn EventBackend>, clock: Arc<dyn Clock>, config: StoreConfig) -> Self {
        Self {
            backend,
            clock,
            config,
            cache: ProjectionCache::new(),
        }
    }

    /// The configuration this store was built with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Appends `event` to its stream and folds it into the stream's projection.
    ///
    /// The event is stamped with the current time, truncated to microseconds
    /// and never earlier than the stream's previous event, so timestamp order
    /// and insertion order agree. The event record and the projection record are persisted together;
    /// on any error neither is, and the cache is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the backend fails,
    /// `StoreError::ConcurrentModification` if the projection kept moving
    /// after `max_conflict_retries` retries, `StoreError::DuplicateCreation`
    /// under the `Reject` policy, and `StoreError::MalformedRecord` if the
    /// stored projection cannot be decoded.
    #[tracing::instrument(
        skip_all,
        fields(stream_id = %event.stream_id(), event_type = event.event_type())
    )]
    pub async fn append(&self, event: A::Event) -> Result<AppendOutcome<A::Event>, StoreError> {
        let stream_id = event.stream_id();
        let mut retries = 0;
        loop {
            match self.try_append(&event).await {
                Err(StoreError::ConcurrentModification {
                    expected, actual, ..
                }) if retries < self.config.max_conflict_retries => {
                    retries += 1;
                    self.cache.invalidate(stream_id);
                    tracing::warn!(retries, expected, actual, "projection moved during append, retrying");
                }
                result => return result,
            }
        }
    }

    async fn try_append(&self, event: &A::Event) -> Result<AppendOutcome<A::Event>, StoreError> {
        let stream_id = event.stream_id();
        let current = self.load_current(stream_id).await?;

        let already_created = current.as_ref().is_some_and(|c| c.state.is_created());
        if event.is_creation() && already_created {
            match self.config.duplicate_creation {
                DuplicateCreationPolicy::LastWriteWins => {
                    tracing::debug!("stream already created, applying creation event again");
                }
                DuplicateCreationPolicy::Reject => {
                    return Err(StoreError::DuplicateCreation(stream_id));
                }
                DuplicateCreationPolicy::Ignore => {
                    tracing::warn!("stream already created, ignoring creation event");
                    return Ok(AppendOutcome::DuplicateCreationIgnored);
                }
            }
        }

        // Microsecond precision is the finest every backend stores losslessly.
        let now = self.clock.now().trunc_subsecs(6);
        let (mut state, expected_version, created_at) = match current {
            Some(cached) => (cached.state, cached.version, now.max(cached.last_event_at)),
            None => (A::default(), 0, now),
        };

        let recorded = RecordedEvent {
            stream_id,
            sequence_number: expected_version + 1,
            created_at,
            event: event.clone(),
        };
        state.apply(&recorded.event);

        let event_record = record::encode_event(&recorded)?;
        let projection_record =
            record::encode_projection(stream_id, recorded.sequence_number, created_at, &state)?;

        self.backend
            .put_durable_pair(stream_id, expected_version, &event_record, &projection_record)
            .await?;

        if self.config.cache_projections {
            self.cache.put(
                stream_id,
                CachedProjection {
                    version: recorded.sequence_number,
                    last_event_at: created_at,
                    state,
                },
            );
        }

        tracing::debug!(sequence_number = recorded.sequence_number, "event appended");
        Ok(AppendOutcome::Recorded(recorded))
    }

    /// Current projection of a stream: cache first, then the backend record.
    async fn load_current(
        &self,
        stream_id: Uuid,
    ) -> Result<Option<CachedProjection<A>>, StoreError> {
        if self.config.cache_projections {
            if let Some(cached) = self.cache.get(stream_id) {
                return Ok(Some(cached));
            }
        }

        let Some(stored) = self.backend.get_projection_record(stream_id).await? else {
            return Ok(None);
        };
        let current = CachedProjection {
            version: stored.version,
            last_event_at: stored.updated_at,
            state: record::decode_projection(&stored)?,
        };
        if self.config.cache_projections {
            self.cache.put(stream_id, current.clone());
        }
        Ok(Some(current))
    }

    /// Returns the materialized view of a stream without replaying it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the projection cannot be
    /// read, or `StoreError::MalformedRecord` if it cannot be decoded.
    #[tracing::instrument(skip(self))]
    pub async fn get_projection(&self, stream_id: Uuid) -> Result<Option<A>, StoreError> {
        Ok(self.load_current(stream_id).await?.map(|current| current.state))
    }

    /// Rebuilds a stream's state by folding every event in replay order.
    ///
    /// Returns `None` if the stream has no records.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the stream cannot be read,
    /// `StoreError::MalformedRecord` if a record cannot be decoded, and
    /// `StoreError::UnknownEventType` for unknown events in strict mode.
    #[tracing::instrument(skip(self))]
    pub async fn get_aggregate(&self, stream_id: Uuid) -> Result<Option<A>, StoreError> {
        let records = self.backend.get_stream_records(stream_id).await?;
        if records.is_empty() {
            return Ok(None);
        }
        let events = self.decode_stream(stream_id, records)?;
        Ok(Some(aggregate::fold(events.iter().map(|r| &r.event))))
    }

    /// Returns the decoded events of a stream in replay order.
    ///
    /// # Errors
    ///
    /// Same as [`EventStore::get_aggregate`].
    #[tracing::instrument(skip(self))]
    pub async fn replay(&self, stream_id: Uuid) -> Result<Vec<RecordedEvent<A::Event>>, StoreError> {
        let records = self.backend.get_stream_records(stream_id).await?;
        self.decode_stream(stream_id, records)
    }

    /// Compares the replayed state of a stream with its durable projection
    /// record, bypassing the cache.
    ///
    /// The two reads are not taken atomically; run this against a stream
    /// with no appends in flight.
    ///
    /// # Errors
    ///
    /// Same as [`EventStore::get_aggregate`].
    #[tracing::instrument(skip(self))]
    pub async fn verify_projection(&self, stream_id: Uuid) -> Result<ProjectionCheck<A>, StoreError> {
        let replayed = self.get_aggregate(stream_id).await?;
        let projected = match self.backend.get_projection_record(stream_id).await? {
            Some(stored) => Some(record::decode_projection::<A>(&stored)?),
            None => None,
        };

        if replayed == projected {
            Ok(ProjectionCheck::Consistent)
        } else {
            tracing::warn!("projection diverges from replayed stream");
            Ok(ProjectionCheck::Diverged {
                replayed,
                projected,
            })
        }
    }

    fn decode_stream(
        &self,
        stream_id: Uuid,
        records: Vec<EventRecord>,
    ) -> Result<Vec<RecordedEvent<A::Event>>, StoreError> {
        let stream = EventStream::from_records(stream_id, records);
        let mut events = Vec::with_capacity(stream.len());
        for stored in stream.replay() {
            match record::decode_event::<A::Event>(stored)? {
                Some(event) => events.push(event),
                None => match self.config.replay_mode {
                    ReplayMode::Permissive => {
                        tracing::warn!(
                            event_type = %stored.event_type,
                            sequence_number = stored.sequence_number,
                            "skipping unknown event type during replay"
                        );
                    }
                    ReplayMode::Strict => {
                        return Err(StoreError::UnknownEventType {
                            stream_id,
                            event_type: stored.event_type.clone(),
                        });
                    }
                },
            }
        }
        Ok(events)
    }
}
