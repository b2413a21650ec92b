//! Domain events for the Student context.

use chrono::NaiveDate;
use registrar_core::event::DomainEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type name of [`StudentCreated`].
pub const STUDENT_CREATED: &str = "student.student_created";
/// Event type name of [`StudentUpdated`].
pub const STUDENT_UPDATED: &str = "student.student_updated";
/// Event type name of [`StudentEnrolled`].
pub const STUDENT_ENROLLED: &str = "student.student_enrolled";
/// Event type name of [`StudentUnenrolled`].
pub const STUDENT_UNENROLLED: &str = "student.student_unenrolled";

/// Emitted when a student is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCreated {
    /// The student identifier.
    pub student_id: Uuid,
    /// The student's full name.
    pub full_name: String,
    /// The student's email address.
    pub email: String,
    /// The student's date of birth.
    pub date_of_birth: NaiveDate,
}

/// Emitted when a student's profile changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdated {
    /// The student identifier.
    pub student_id: Uuid,
    /// The new full name.
    pub full_name: String,
    /// The new email address.
    pub email: String,
}

/// Emitted when a student enrolls in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEnrolled {
    /// The student identifier.
    pub student_id: Uuid,
    /// The course enrolled in.
    pub course_name: String,
}

/// Emitted when a student leaves a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUnenrolled {
    /// The student identifier.
    pub student_id: Uuid,
    /// The course left.
    pub course_name: String,
}

/// Event variants for the Student context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentEvent {
    /// A student has been registered.
    Created(StudentCreated),
    /// A student's profile has been updated.
    Updated(StudentUpdated),
    /// A student has enrolled in a course.
    Enrolled(StudentEnrolled),
    /// A student has left a course.
    Unenrolled(StudentUnenrolled),
}

impl DomainEvent for StudentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => STUDENT_CREATED,
            Self::Updated(_) => STUDENT_UPDATED,
            Self::Enrolled(_) => STUDENT_ENROLLED,
            Self::Unenrolled(_) => STUDENT_UNENROLLED,
        }
    }

    fn stream_id(&self) -> Uuid {
        match self {
            Self::Created(e) => e.student_id,
            Self::Updated(e) => e.student_id,
            Self::Enrolled(e) => e.student_id,
            Self::Unenrolled(e) => e.student_id,
        }
    }

    fn is_creation(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Created(e) => serde_json::to_value(e),
            Self::Updated(e) => serde_json::to_value(e),
            Self::Enrolled(e) => serde_json::to_value(e),
            Self::Unenrolled(e) => serde_json::to_value(e),
        }
    }

    fn from_payload(
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        let event = match event_type {
            STUDENT_CREATED => Self::Created(serde_json::from_value(payload)?),
            STUDENT_UPDATED => Self::Updated(serde_json::from_value(payload)?),
            STUDENT_ENROLLED => Self::Enrolled(serde_json::from_value(payload)?),
            STUDENT_UNENROLLED => Self::Unenrolled(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}
