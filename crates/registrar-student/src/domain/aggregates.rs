//! Aggregate state for the Student context.

use chrono::NaiveDate;
use registrar_core::aggregate::Aggregate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::StudentEvent;

/// Materialized state of a student, folded from the student's events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Full name.
    pub full_name: String,
    /// Email address.
    pub email: String,
    /// Courses in enrollment order, without duplicates.
    pub enrolled_courses: Vec<String>,
    /// Date of birth, once the student has been created.
    pub date_of_birth: Option<NaiveDate>,
}

impl Student {
    /// Whether the student is enrolled in `course_name`.
    #[must_use]
    pub fn is_enrolled_in(&self, course_name: &str) -> bool {
        self.enrolled_courses.iter().any(|c| c == course_name)
    }
}

impl Aggregate for Student {
    type Event = StudentEvent;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StudentEvent::Created(created) => {
                self.id = created.student_id;
                self.full_name.clone_from(&created.full_name);
                self.email.clone_from(&created.email);
                self.date_of_birth = Some(created.date_of_birth);
            }
            StudentEvent::Updated(updated) => {
                self.full_name.clone_from(&updated.full_name);
                self.email.clone_from(&updated.email);
            }
            StudentEvent::Enrolled(enrolled) => {
                if !self.is_enrolled_in(&enrolled.course_name) {
                    self.enrolled_courses.push(enrolled.course_name.clone());
                }
            }
            StudentEvent::Unenrolled(unenrolled) => {
                self.enrolled_courses.retain(|c| *c != unenrolled.course_name);
            }
        }
    }

    fn is_created(&self) -> bool {
        self.date_of_birth.is_some()
    }
}
