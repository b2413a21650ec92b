//! Query handlers for the Student context.
//!
//! `get_student_by_id` rebuilds the student from its events, while
//! `get_student_view_by_id` reads the stored projection. Both return the same
//! view shape so callers can switch freely.

use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::error::StoreError;
use registrar_core::event::DomainEvent;
use registrar_core::store::EventStore;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Student;

/// Read-only view of a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentView {
    /// The student identifier.
    pub student_id: Uuid,
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Courses in enrollment order.
    pub enrolled_courses: Vec<String>,
    /// Date of birth, absent if the stream never saw a creation event.
    pub date_of_birth: Option<NaiveDate>,
}

impl StudentView {
    fn from_student(student_id: Uuid, student: Student) -> Self {
        Self {
            student_id,
            full_name: student.full_name,
            email: student.email,
            enrolled_courses: student.enrolled_courses,
            date_of_birth: student.date_of_birth,
        }
    }
}

/// One entry of a student's audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentHistoryEntry {
    /// Position of the event in the stream.
    pub sequence_number: i64,
    /// Event type name.
    pub event_type: String,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Retrieves a student by replaying its event stream.
///
/// # Errors
///
/// Returns any error from `EventStore::get_aggregate`.
pub async fn get_student_by_id(
    student_id: Uuid,
    store: &EventStore<Student>,
) -> Result<Option<StudentView>, StoreError> {
    let student = store.get_aggregate(student_id).await?;
    Ok(student.map(|s| StudentView::from_student(student_id, s)))
}

/// Retrieves a student from its materialized projection.
///
/// # Errors
///
/// Returns any error from `EventStore::get_projection`.
pub async fn get_student_view_by_id(
    student_id: Uuid,
    store: &EventStore<Student>,
) -> Result<Option<StudentView>, StoreError> {
    let student = store.get_projection(student_id).await?;
    Ok(student.map(|s| StudentView::from_student(student_id, s)))
}

/// Lists the events recorded for a student, in replay order.
///
/// Unknown event types are skipped or rejected according to the store's
/// replay mode.
///
/// # Errors
///
/// Returns any error from `EventStore::replay`.
pub async fn get_student_history(
    student_id: Uuid,
    store: &EventStore<Student>,
) -> Result<Vec<StudentHistoryEntry>, StoreError> {
    let events = store.replay(student_id).await?;
    Ok(events
        .into_iter()
        .map(|recorded| StudentHistoryEntry {
            sequence_number: recorded.sequence_number,
            event_type: recorded.event.event_type().to_owned(),
            created_at: recorded.created_at,
        })
        .collect())
}
