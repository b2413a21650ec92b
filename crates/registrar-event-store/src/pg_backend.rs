//! `PostgreSQL` implementation of the `EventBackend` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use registrar_core::backend::EventBackend;
use registrar_core::error::StoreError;
use registrar_core::record::{EventRecord, ProjectionRecord, projection_partition_key};

use crate::schema;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed event backend.
///
/// Each pair write runs in one transaction: the projection row is inserted
/// or updated only if it is still at the expected version, then the event
/// row is inserted. Dropping the future before commit rolls both back.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Creates a new `PgBackend`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the event store tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the statements fail.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(schema::CREATE_TABLES)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::BackendUnavailable(err.to_string())
}

fn malformed(stream_id: Uuid, err: &sqlx::Error) -> StoreError {
    StoreError::MalformedRecord {
        stream_id,
        reason: err.to_string(),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

async fn current_version(
    tx: &mut Transaction<'_, Postgres>,
    stream_id: Uuid,
) -> Result<i64, StoreError> {
    let version: Option<i64> = sqlx::query_scalar("SELECT version FROM projections WHERE pk = $1")
        .bind(projection_partition_key(stream_id))
        .fetch_optional(&mut **tx)
        .await
        .map_err(unavailable)?;
    Ok(version.unwrap_or(0))
}

fn event_from_row(stream_id: Uuid, row: &PgRow) -> Result<EventRecord, StoreError> {
    let record = EventRecord {
        pk: row.try_get("pk").map_err(|e| malformed(stream_id, &e))?,
        sk: row.try_get("sk").map_err(|e| malformed(stream_id, &e))?,
        stream_id: row.try_get("stream_id").map_err(|e| malformed(stream_id, &e))?,
        sequence_number: row
            .try_get("sequence_number")
            .map_err(|e| malformed(stream_id, &e))?,
        event_type: row.try_get("event_type").map_err(|e| malformed(stream_id, &e))?,
        payload: row.try_get("payload").map_err(|e| malformed(stream_id, &e))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| malformed(stream_id, &e))?,
    };
    Ok(record)
}

fn projection_from_row(stream_id: Uuid, row: &PgRow) -> Result<ProjectionRecord, StoreError> {
    Ok(ProjectionRecord {
        pk: row.try_get("pk").map_err(|e| malformed(stream_id, &e))?,
        sk: row.try_get("sk").map_err(|e| malformed(stream_id, &e))?,
        stream_id: row.try_get("stream_id").map_err(|e| malformed(stream_id, &e))?,
        version: row.try_get("version").map_err(|e| malformed(stream_id, &e))?,
        state: row.try_get("state").map_err(|e| malformed(stream_id, &e))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| malformed(stream_id, &e))?,
    })
}

#[async_trait]
impl EventBackend for PgBackend {
    #[tracing::instrument(skip(self, event, projection), fields(sequence_number = event.sequence_number))]
    async fn put_durable_pair(
        &self,
        stream_id: Uuid,
        expected_version: i64,
        event: &EventRecord,
        projection: &ProjectionRecord,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let projection_write = if expected_version == 0 {
            sqlx::query(
                r"INSERT INTO projections (pk, sk, stream_id, version, state, updated_at)
                  VALUES ($1, $2, $3, $4, $5, $6)
                  ON CONFLICT (pk) DO NOTHING",
            )
            .bind(&projection.pk)
            .bind(&projection.sk)
            .bind(stream_id)
            .bind(projection.version)
            .bind(&projection.state)
            .bind(projection.updated_at)
            .execute(&mut *tx)
            .await
        } else {
            sqlx::query(
                r"UPDATE projections
                  SET version = $2, state = $3, updated_at = $4
                  WHERE pk = $1 AND version = $5",
            )
            .bind(&projection.pk)
            .bind(projection.version)
            .bind(&projection.state)
            .bind(projection.updated_at)
            .bind(expected_version)
            .execute(&mut *tx)
            .await
        };

        let written = projection_write.map_err(unavailable)?.rows_affected();
        if written == 0 {
            let actual = current_version(&mut tx, stream_id).await?;
            tx.rollback().await.map_err(unavailable)?;
            return Err(StoreError::ConcurrentModification {
                stream_id,
                expected: expected_version,
                actual,
            });
        }

        let event_write = sqlx::query(
            r"INSERT INTO stream_events
                (pk, sk, stream_id, sequence_number, event_type, payload, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&event.pk)
        .bind(&event.sk)
        .bind(stream_id)
        .bind(event.sequence_number)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = event_write {
            tx.rollback().await.map_err(unavailable)?;
            if is_unique_violation(&err) {
                return Err(StoreError::ConcurrentModification {
                    stream_id,
                    expected: expected_version,
                    actual: event.sequence_number,
                });
            }
            return Err(unavailable(err));
        }

        tx.commit().await.map_err(unavailable)?;
        tracing::debug!("event and projection committed");
        Ok(())
    }

    async fn get_projection_record(
        &self,
        stream_id: Uuid,
    ) -> Result<Option<ProjectionRecord>, StoreError> {
        let row = sqlx::query(
            r"SELECT pk, sk, stream_id, version, state, updated_at
              FROM projections
              WHERE pk = $1",
        )
        .bind(projection_partition_key(stream_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(|row| projection_from_row(stream_id, &row))
            .transpose()
    }

    async fn get_stream_records(&self, stream_id: Uuid) -> Result<Vec<EventRecord>, StoreError> {
        let rows = sqlx::query(
            r"SELECT pk, sk, stream_id, sequence_number, event_type, payload, created_at
              FROM stream_events
              WHERE stream_id = $1
              ORDER BY created_at ASC, sequence_number ASC",
        )
        .bind(stream_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(|row| event_from_row(stream_id, row)).collect()
    }
}
