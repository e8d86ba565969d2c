//! Enrollment domain module.
//!
//! A student enrollment binds one student to one batch and carries its own
//! fee and payment state. The rules here are pure; loading the referenced
//! student, batch and course and persisting the result is done by the caller.

pub mod enrollment;
pub mod rules;

pub use enrollment::{
    EnrollStudent, EnrollmentId, EnrollmentRefs, EnrollmentStatus, StudentEnrollment,
    UpdateEnrollment,
};
pub use rules::{ensure_capacity, ensure_enrollment_date, ensure_not_duplicate};
