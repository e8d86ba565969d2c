//! Admission checks run before an enrollment is written.

use chrono::NaiveDate;

use tutorbook_catalog::Batch;
use tutorbook_core::{DomainError, DomainResult};

use crate::enrollment::{EnrollmentStatus, StudentEnrollment};

/// At most one Active enrollment per (student, batch).
///
/// `existing` are the stored enrollments of the same student in the same
/// batch; the candidate itself is skipped by id.
pub fn ensure_not_duplicate(
    candidate: &StudentEnrollment,
    existing: &[StudentEnrollment],
) -> DomainResult<()> {
    if candidate.status != EnrollmentStatus::Active {
        return Ok(());
    }
    let duplicate = existing.iter().any(|e| {
        e.id != candidate.id
            && e.student_id == candidate.student_id
            && e.batch_id == candidate.batch_id
            && e.status == EnrollmentStatus::Active
    });
    if duplicate {
        return Err(DomainError::validation(
            "student is already enrolled in this batch",
        ));
    }
    Ok(())
}

/// A seat must be free for an enrollment that becomes Active.
///
/// Only called on the transition into Active; an enrollment already counted in
/// `current_enrollment` is not checked against its own seat.
pub fn ensure_capacity(batch: &Batch) -> DomainResult<()> {
    match batch.capacity {
        Some(capacity) if batch.current_enrollment >= capacity => Err(DomainError::validation(
            "batch is full, no available slots",
        )),
        _ => Ok(()),
    }
}

pub fn ensure_enrollment_date(date: NaiveDate, batch: &Batch) -> DomainResult<()> {
    if let Some(start) = batch.start_date {
        if date < start {
            return Err(DomainError::validation(format!(
                "invalid enrollment date: {date} is before batch start date {start}"
            )));
        }
    }
    if let Some(end) = batch.end_date {
        if date > end {
            return Err(DomainError::validation(format!(
                "invalid enrollment date: {date} is after batch end date {end}"
            )));
        }
    }
    Ok(())
}
