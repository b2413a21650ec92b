//! Shared helpers for Student integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use registrar_core::backend::EventBackend;
use registrar_core::config::StoreConfig;
use registrar_core::store::EventStore;
use registrar_student::domain::aggregates::Student;
use registrar_student::domain::commands::{EnrollStudent, RegisterStudent, UpdateStudentProfile};
use registrar_test_support::SteppingClock;
use uuid::Uuid;

/// First instant handed out by test clocks.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Build a student store over `backend` whose clock ticks one second per event.
pub fn build_store(backend: Arc<dyn EventBackend>, config: StoreConfig) -> EventStore<Student> {
    EventStore::new(
        backend,
        Arc::new(SteppingClock::new(base_time(), Duration::seconds(1))),
        config,
    )
}

pub fn register_john(student_id: Uuid) -> RegisterStudent {
    RegisterStudent {
        student_id,
        full_name: "John Doe".to_owned(),
        email: "john.doe@gmail.com".to_owned(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
    }
}

pub fn enroll(student_id: Uuid, course_name: &str) -> EnrollStudent {
    EnrollStudent {
        student_id,
        course_name: course_name.to_owned(),
    }
}

pub fn change_email(student_id: Uuid, email: &str) -> UpdateStudentProfile {
    UpdateStudentProfile {
        student_id,
        full_name: "John Doe".to_owned(),
        email: email.to_owned(),
    }
}
