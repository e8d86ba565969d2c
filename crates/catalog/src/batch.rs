use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tutorbook_core::{DateRange, DomainError, DomainResult, Record};

use crate::course::{Course, CourseId};

tutorbook_core::record_id!(BatchId, "BatchId");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

/// A scheduled run of a course with an optional seat limit.
///
/// `current_enrollment` is derived: it is always recomputed from the active
/// enrollments referencing the batch and never incremented in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub course_id: CourseId,
    pub course_name: String,
    pub batch_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `None` means unlimited seats.
    pub capacity: Option<u32>,
    pub current_enrollment: u32,
    pub class_time: Option<String>,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBatch {
    pub course_id: CourseId,
    pub batch_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub capacity: Option<u32>,
    pub class_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub batch_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub capacity: Option<u32>,
    pub class_time: Option<String>,
    pub status: Option<BatchStatus>,
}

/// `"<course name> - <Mon> <year>"`, or just the course name without a start date.
pub fn generate_batch_name(course_name: &str, start_date: Option<NaiveDate>) -> String {
    match start_date {
        Some(start) => format!("{course_name} - {}", start.format("%b %Y")),
        None => course_name.to_string(),
    }
}

impl Batch {
    pub fn schedule(
        cmd: &ScheduleBatch,
        course: &Course,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let batch_name = cmd
            .batch_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| generate_batch_name(&course.course_name, cmd.start_date));

        let batch = Self {
            id: BatchId::generate(),
            course_id: course.id,
            course_name: course.course_name.clone(),
            batch_name,
            start_date: cmd.start_date,
            end_date: cmd.end_date,
            capacity: cmd.capacity,
            current_enrollment: 0,
            class_time: cmd.class_time.clone(),
            status: BatchStatus::Active,
            created_at: now,
            version: 0,
        };
        batch.validate()?;
        Ok(batch)
    }

    pub fn apply_update(&mut self, cmd: &UpdateBatch) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = cmd.batch_name.as_deref().map(str::trim) {
            next.batch_name = if name.is_empty() {
                generate_batch_name(&next.course_name, cmd.start_date.or(next.start_date))
            } else {
                name.to_string()
            };
        }
        if cmd.start_date.is_some() {
            next.start_date = cmd.start_date;
        }
        if cmd.end_date.is_some() {
            next.end_date = cmd.end_date;
        }
        if cmd.capacity.is_some() {
            next.capacity = cmd.capacity;
        }
        if cmd.class_time.is_some() {
            next.class_time = cmd.class_time.clone();
        }
        if let Some(status) = cmd.status {
            next.status = status;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.schedule_window()?;
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return Err(DomainError::validation("capacity must be greater than zero"));
            }
            if self.current_enrollment > capacity {
                return Err(DomainError::validation(format!(
                    "capacity {capacity} is below the {} students already enrolled",
                    self.current_enrollment
                )));
            }
        }
        Ok(())
    }

    pub fn schedule_window(&self) -> DomainResult<DateRange> {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Remaining seats; `None` when the batch has no capacity limit.
    pub fn available_slots(&self) -> Option<u32> {
        self.capacity
            .map(|capacity| capacity.saturating_sub(self.current_enrollment))
    }

    /// Never true for a batch without a capacity limit.
    pub fn is_full(&self) -> bool {
        self.available_slots() == Some(0)
    }

    /// Overwrite the derived seat count with a freshly computed value.
    pub fn set_enrollment_count(&mut self, count: u32) {
        self.current_enrollment = count;
    }

    pub fn refresh_course_name(&mut self, course: &Course) {
        self.course_name = course.course_name.clone();
    }
}

impl Record for Batch {
    type Id = BatchId;
    const KIND: &'static str = "batch";

    fn id(&self) -> BatchId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
