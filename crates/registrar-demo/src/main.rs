//! Registrar demo entry point.
//!
//! Registers a student, enrolls them in a course, changes their email, then
//! reads the student back through both the replay and the projection paths.

use std::error::Error;
use std::sync::Arc;

use chrono::NaiveDate;
use registrar_core::backend::EventBackend;
use registrar_core::clock::SystemClock;
use registrar_core::store::{EventStore, ProjectionCheck};
use registrar_event_store::memory::InMemoryBackend;
use registrar_event_store::pg_backend::PgBackend;
use registrar_student::application::command_handlers::{
    handle_enroll_student, handle_register_student, handle_update_student_profile,
};
use registrar_student::application::query_handlers::{
    get_student_by_id, get_student_history, get_student_view_by_id,
};
use registrar_student::domain::aggregates::Student;
use registrar_student::domain::commands::{EnrollStudent, RegisterStudent, UpdateStudentProfile};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use config::{AppConfig, BackendKind};
use error::AppError;

mod config;
mod error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(backend = config.backend.name(), store = ?config.store, "Starting Registrar demo");

    let backend = connect(&config.backend).await?;
    let store = EventStore::<Student>::new(backend, Arc::new(SystemClock), config.store);

    run_walkthrough(&store).await?;
    Ok(())
}

/// Builds the configured backend, creating the PostgreSQL schema if needed.
async fn connect(kind: &BackendKind) -> Result<Arc<dyn EventBackend>, AppError> {
    match kind {
        BackendKind::Memory => Ok(Arc::new(InMemoryBackend::new())),
        BackendKind::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(database_url)
                .await?;
            let backend = PgBackend::new(pool);
            backend.ensure_schema().await?;
            Ok(Arc::new(backend))
        }
    }
}

async fn run_walkthrough(store: &EventStore<Student>) -> Result<(), AppError> {
    let student_id = Uuid::new_v4();
    let date_of_birth = NaiveDate::from_ymd_opt(1990, 1, 1)
        .ok_or_else(|| AppError::Config("invalid demo date of birth".to_string()))?;

    handle_register_student(
        &RegisterStudent {
            student_id,
            full_name: "John Doe".to_string(),
            email: "john.doe@gmail.com".to_string(),
            date_of_birth,
        },
        store,
    )
    .await?;
    handle_enroll_student(
        &EnrollStudent {
            student_id,
            course_name: "From Zero to Hero: REST APIs in .NET".to_string(),
        },
        store,
    )
    .await?;
    handle_update_student_profile(
        &UpdateStudentProfile {
            student_id,
            full_name: "John Doe".to_string(),
            email: "john.doe2@gmail.com".to_string(),
        },
        store,
    )
    .await?;

    let replayed = get_student_by_id(student_id, store).await?;
    tracing::info!(%student_id, student = ?replayed, "Student rebuilt from events");

    let projected = get_student_view_by_id(student_id, store).await?;
    tracing::info!(%student_id, student = ?projected, "Student read from projection");

    for entry in get_student_history(student_id, store).await? {
        tracing::info!(
            sequence_number = entry.sequence_number,
            event_type = %entry.event_type,
            created_at = %entry.created_at,
            "History entry"
        );
    }

    match store.verify_projection(student_id).await? {
        ProjectionCheck::Consistent => {
            tracing::info!(%student_id, "Projection matches replayed stream");
        }
        ProjectionCheck::Diverged {
            replayed,
            projected,
        } => {
            tracing::warn!(%student_id, ?replayed, ?projected, "Projection diverges from replayed stream");
        }
    }

    Ok(())
}
