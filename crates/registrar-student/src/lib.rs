//! Registrar — Student enrollment bounded context.
//!
//! Responsible for student registration, profile changes, and course
//! enrollment, all derived from the student's event stream.

pub mod application;
pub mod domain;
