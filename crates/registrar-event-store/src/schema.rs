//! Event store database schema.

/// SQL to create the event and projection tables.
///
/// Kept in step with `migrations/0001_create_event_store.sql`.
pub const CREATE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS stream_events (
    pk              TEXT NOT NULL,
    sk              TEXT NOT NULL,
    stream_id       UUID NOT NULL,
    sequence_number BIGINT NOT NULL,
    event_type      VARCHAR(255) NOT NULL,
    payload         JSONB NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (stream_id, sequence_number)
);

CREATE INDEX IF NOT EXISTS idx_stream_events_replay
    ON stream_events (stream_id, created_at, sequence_number);

CREATE TABLE IF NOT EXISTS projections (
    pk         TEXT PRIMARY KEY,
    sk         TEXT NOT NULL,
    stream_id  UUID NOT NULL UNIQUE,
    version    BIGINT NOT NULL,
    state      JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
";
