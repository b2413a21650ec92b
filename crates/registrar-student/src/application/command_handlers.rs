//! Command handlers for the Student context.
//!
//! This module contains application-level command handler functions that
//! validate a command, check the student exists where required, and append
//! the resulting event to the store.

use registrar_core::command::Command;
use registrar_core::error::StoreError;
use registrar_core::store::{AppendOutcome, EventStore};
use uuid::Uuid;

use crate::domain::aggregates::Student;
use crate::domain::commands::{EnrollStudent, RegisterStudent, UnenrollStudent, UpdateStudentProfile};
use crate::domain::events::{
    StudentCreated, StudentEnrolled, StudentEvent, StudentUnenrolled, StudentUpdated,
};

fn validate_full_name(full_name: &str) -> Result<(), StoreError> {
    if full_name.trim().is_empty() {
        return Err(StoreError::Validation("full name must not be empty".into()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), StoreError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(StoreError::Validation(format!(
            "email `{email}` is not a valid address"
        ))),
    }
}

fn validate_course_name(course_name: &str) -> Result<(), StoreError> {
    if course_name.trim().is_empty() {
        return Err(StoreError::Validation("course name must not be empty".into()));
    }
    Ok(())
}

/// Loads the student's projection, failing if the student does not exist.
async fn require_student(
    student_id: Uuid,
    store: &EventStore<Student>,
) -> Result<Student, StoreError> {
    store
        .get_projection(student_id)
        .await?
        .ok_or(StoreError::AggregateNotFound(student_id))
}

/// Handles the `RegisterStudent` command: validates the profile and appends
/// a `StudentCreated` event.
///
/// Registering an existing student is governed by the store's duplicate
/// creation policy.
///
/// # Errors
///
/// Returns `StoreError::Validation` for a blank name or invalid email, and
/// any error from `EventStore::append`.
#[tracing::instrument(
    skip_all,
    fields(command_type = command.command_type(), student_id = %command.student_id)
)]
pub async fn handle_register_student(
    command: &RegisterStudent,
    store: &EventStore<Student>,
) -> Result<AppendOutcome<StudentEvent>, StoreError> {
    validate_full_name(&command.full_name)?;
    validate_email(&command.email)?;

    let event = StudentEvent::Created(StudentCreated {
        student_id: command.student_id,
        full_name: command.full_name.trim().to_owned(),
        email: command.email.trim().to_owned(),
        date_of_birth: command.date_of_birth,
    });

    store.append(event).await
}

/// Handles the `UpdateStudentProfile` command: validates the new profile and
/// appends a `StudentUpdated` event.
///
/// # Errors
///
/// Returns `StoreError::Validation` for a blank name or invalid email,
/// `StoreError::AggregateNotFound` if the student does not exist, and any
/// error from `EventStore::append`.
#[tracing::instrument(
    skip_all,
    fields(command_type = command.command_type(), student_id = %command.student_id)
)]
pub async fn handle_update_student_profile(
    command: &UpdateStudentProfile,
    store: &EventStore<Student>,
) -> Result<AppendOutcome<StudentEvent>, StoreError> {
    validate_full_name(&command.full_name)?;
    validate_email(&command.email)?;
    require_student(command.student_id, store).await?;

    let event = StudentEvent::Updated(StudentUpdated {
        student_id: command.student_id,
        full_name: command.full_name.trim().to_owned(),
        email: command.email.trim().to_owned(),
    });

    store.append(event).await
}

/// Handles the `EnrollStudent` command: appends a `StudentEnrolled` event.
///
/// Enrolling in a course the student already takes is still recorded; the
/// fold keeps a single entry.
///
/// # Errors
///
/// Returns `StoreError::Validation` for a blank course name,
/// `StoreError::AggregateNotFound` if the student does not exist, and any
/// error from `EventStore::append`.
#[tracing::instrument(
    skip_all,
    fields(command_type = command.command_type(), student_id = %command.student_id)
)]
pub async fn handle_enroll_student(
    command: &EnrollStudent,
    store: &EventStore<Student>,
) -> Result<AppendOutcome<StudentEvent>, StoreError> {
    validate_course_name(&command.course_name)?;
    require_student(command.student_id, store).await?;

    let event = StudentEvent::Enrolled(StudentEnrolled {
        student_id: command.student_id,
        course_name: command.course_name.trim().to_owned(),
    });

    store.append(event).await
}

/// Handles the `UnenrollStudent` command: appends a `StudentUnenrolled` event.
///
/// # Errors
///
/// Returns `StoreError::Validation` for a blank course name,
/// `StoreError::AggregateNotFound` if the student does not exist, and any
/// error from `EventStore::append`.
#[tracing::instrument(
    skip_all,
    fields(command_type = command.command_type(), student_id = %command.student_id)
)]
pub async fn handle_unenroll_student(
    command: &UnenrollStudent,
    store: &EventStore<Student>,
) -> Result<AppendOutcome<StudentEvent>, StoreError> {
    validate_course_name(&command.course_name)?;
    let student = require_student(command.student_id, store).await?;
    if !student.is_enrolled_in(command.course_name.trim()) {
        tracing::debug!(course_name = %command.course_name, "student not enrolled, recording anyway");
    }

    let event = StudentEvent::Unenrolled(StudentUnenrolled {
        student_id: command.student_id,
        course_name: command.course_name.trim().to_owned(),
    });

    store.append(event).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};
    use registrar_core::config::StoreConfig;
    use registrar_core::error::StoreError;
    use registrar_core::store::EventStore;
    use registrar_event_store::memory::InMemoryBackend;
    use registrar_test_support::{FailingBackend, FixedClock};
    use uuid::Uuid;

    use crate::application::command_handlers::{
        handle_enroll_student, handle_register_student, handle_unenroll_student,
        handle_update_student_profile,
    };
    use crate::domain::aggregates::Student;
    use crate::domain::commands::{
        EnrollStudent, RegisterStudent, UnenrollStudent, UpdateStudentProfile,
    };
    use crate::domain::events::StudentEvent;

    fn in_memory_store() -> EventStore<Student> {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        EventStore::new(
            Arc::new(InMemoryBackend::new()),
            Arc::new(clock),
            StoreConfig::default(),
        )
    }

    fn register(student_id: Uuid) -> RegisterStudent {
        RegisterStudent {
            student_id,
            full_name: "John Doe".to_owned(),
            email: "john@x.com".to_owned(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_handle_register_student_records_created_event() {
        // Arrange
        let store = in_memory_store();
        let student_id = Uuid::new_v4();

        // Act
        let outcome = handle_register_student(&register(student_id), &store)
            .await
            .unwrap();

        // Assert
        let recorded = outcome.recorded().unwrap();
        assert_eq!(recorded.stream_id, student_id);
        assert_eq!(recorded.sequence_number, 1);
        assert_eq!(
            recorded.created_at,
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        );
        match &recorded.event {
            StudentEvent::Created(created) => {
                assert_eq!(created.full_name, "John Doe");
                assert_eq!(created.email, "john@x.com");
            }
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_register_student_trims_profile_fields() {
        // Arrange
        let store = in_memory_store();
        let student_id = Uuid::new_v4();
        let mut command = register(student_id);
        command.full_name = "  John Doe ".to_owned();
        command.email = " john@x.com ".to_owned();

        // Act
        handle_register_student(&command, &store).await.unwrap();

        // Assert
        let student = store.get_projection(student_id).await.unwrap().unwrap();
        assert_eq!(student.full_name, "John Doe");
        assert_eq!(student.email, "john@x.com");
    }

    #[tokio::test]
    async fn test_handle_register_student_rejects_blank_name() {
        // Arrange
        let store = in_memory_store();
        let mut command = register(Uuid::new_v4());
        command.full_name = "   ".to_owned();

        // Act
        let result = handle_register_student(&command, &store).await;

        // Assert
        match result {
            Err(StoreError::Validation(msg)) => assert_eq!(msg, "full name must not be empty"),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(store.get_aggregate(command.student_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_handle_register_student_rejects_invalid_email() {
        // Arrange
        let store = in_memory_store();
        let mut command = register(Uuid::new_v4());
        command.email = "john.example.com".to_owned();

        // Act
        let result = handle_register_student(&command, &store).await;

        // Assert
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handle_update_student_profile_requires_existing_student() {
        // Arrange
        let store = in_memory_store();
        let student_id = Uuid::new_v4();
        let command = UpdateStudentProfile {
            student_id,
            full_name: "John Doe".to_owned(),
            email: "john2@x.com".to_owned(),
        };

        // Act
        let result = handle_update_student_profile(&command, &store).await;

        // Assert
        match result {
            Err(StoreError::AggregateNotFound(id)) => assert_eq!(id, student_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_update_student_profile_changes_email() {
        // Arrange
        let store = in_memory_store();
        let student_id = Uuid::new_v4();
        handle_register_student(&register(student_id), &store)
            .await
            .unwrap();

        // Act
        handle_update_student_profile(
            &UpdateStudentProfile {
                student_id,
                full_name: "John Doe".to_owned(),
                email: "john2@x.com".to_owned(),
            },
            &store,
        )
        .await
        .unwrap();

        // Assert
        let student = store.get_aggregate(student_id).await.unwrap().unwrap();
        assert_eq!(student.email, "john2@x.com");
    }

    #[tokio::test]
    async fn test_handle_enroll_student_rejects_blank_course() {
        // Arrange
        let store = in_memory_store();
        let student_id = Uuid::new_v4();
        handle_register_student(&register(student_id), &store)
            .await
            .unwrap();

        // Act
        let result = handle_enroll_student(
            &EnrollStudent {
                student_id,
                course_name: String::new(),
            },
            &store,
        )
        .await;

        // Assert
        match result {
            Err(StoreError::Validation(msg)) => assert_eq!(msg, "course name must not be empty"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enroll_then_unenroll_round_trip() {
        // Arrange
        let store = in_memory_store();
        let student_id = Uuid::new_v4();
        handle_register_student(&register(student_id), &store)
            .await
            .unwrap();

        // Act
        handle_enroll_student(
            &EnrollStudent {
                student_id,
                course_name: "Databases".to_owned(),
            },
            &store,
        )
        .await
        .unwrap();
        let enrolled = store.get_projection(student_id).await.unwrap().unwrap();
        handle_unenroll_student(
            &UnenrollStudent {
                student_id,
                course_name: "Databases".to_owned(),
            },
            &store,
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(enrolled.enrolled_courses, vec!["Databases".to_owned()]);
        let student = store.get_aggregate(student_id).await.unwrap().unwrap();
        assert!(student.enrolled_courses.is_empty());
    }

    #[tokio::test]
    async fn test_handle_enroll_student_propagates_backend_failure() {
        // Arrange
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let store: EventStore<Student> = EventStore::new(
            Arc::new(FailingBackend),
            Arc::new(clock),
            StoreConfig::default(),
        );

        // Act
        let result = handle_enroll_student(
            &EnrollStudent {
                student_id: Uuid::new_v4(),
                course_name: "Databases".to_owned(),
            },
            &store,
        )
        .await;

        // Assert
        match result {
            Err(StoreError::BackendUnavailable(msg)) => assert_eq!(msg, "connection refused"),
            other => panic!("expected BackendUnavailable, got {other:?}"),
        }
    }
}
