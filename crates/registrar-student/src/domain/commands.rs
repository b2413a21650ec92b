//! Commands for the Student context.

use chrono::NaiveDate;
use registrar_core::command::Command;
use uuid::Uuid;

/// Command to register a new student.
#[derive(Debug, Clone)]
pub struct RegisterStudent {
    /// The identifier chosen for the student.
    pub student_id: Uuid,
    /// The student's full name.
    pub full_name: String,
    /// The student's email address.
    pub email: String,
    /// The student's date of birth.
    pub date_of_birth: NaiveDate,
}

impl Command for RegisterStudent {
    fn command_type(&self) -> &'static str {
        "student.register_student"
    }

    fn stream_id(&self) -> Uuid {
        self.student_id
    }
}

/// Command to change a student's name and email.
#[derive(Debug, Clone)]
pub struct UpdateStudentProfile {
    /// The student identifier.
    pub student_id: Uuid,
    /// The new full name.
    pub full_name: String,
    /// The new email address.
    pub email: String,
}

impl Command for UpdateStudentProfile {
    fn command_type(&self) -> &'static str {
        "student.update_student_profile"
    }

    fn stream_id(&self) -> Uuid {
        self.student_id
    }
}

/// Command to enroll a student in a course.
#[derive(Debug, Clone)]
pub struct EnrollStudent {
    /// The student identifier.
    pub student_id: Uuid,
    /// The course to enroll in.
    pub course_name: String,
}

impl Command for EnrollStudent {
    fn command_type(&self) -> &'static str {
        "student.enroll_student"
    }

    fn stream_id(&self) -> Uuid {
        self.student_id
    }
}

/// Command to remove a student from a course.
#[derive(Debug, Clone)]
pub struct UnenrollStudent {
    /// The student identifier.
    pub student_id: Uuid,
    /// The course to leave.
    pub course_name: String,
}

impl Command for UnenrollStudent {
    fn command_type(&self) -> &'static str {
        "student.unenroll_student"
    }

    fn stream_id(&self) -> Uuid {
        self.student_id
    }
}
