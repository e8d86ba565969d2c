use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tutorbook_catalog::{Batch, BatchId, Course, CourseId};
use tutorbook_core::{DomainError, DomainResult, Record};
use tutorbook_students::{Student, StudentId};

tutorbook_core::record_id!(AttendanceId, "AttendanceId");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

/// Records an attendance mark copies names and schedule from.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceRefs<'a> {
    pub student: &'a Student,
    pub batch: &'a Batch,
    pub course: Option<&'a Course>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub student_id: StudentId,
    pub batch_id: BatchId,
    pub course_id: CourseId,
    pub attendance_date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: String,
    pub student_name: String,
    pub batch_name: String,
    pub course_name: String,
    pub class_time: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAttendance {
    pub student_id: StudentId,
    pub batch_id: BatchId,
    pub attendance_date: NaiveDate,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
    pub class_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateAttendance {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    pub class_time: Option<String>,
}

/// One line of a roster submitted for a (batch, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student: StudentId,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
}

/// Outcome of a roster upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterResult {
    pub created: usize,
    pub updated: usize,
    pub total: usize,
}

impl RosterResult {
    pub fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.updated += 1;
        }
        self.total = self.created + self.updated;
    }
}

/// Attendance can only be recorded for today or earlier.
pub fn ensure_not_future(date: NaiveDate, today: NaiveDate) -> DomainResult<()> {
    if date > today {
        return Err(DomainError::validation(
            "attendance date cannot be in the future",
        ));
    }
    Ok(())
}

impl Attendance {
    /// `duplicate_exists` is whether another mark is stored for the same
    /// (student, batch, date).
    pub fn mark(
        cmd: &MarkAttendance,
        refs: &AttendanceRefs<'_>,
        duplicate_exists: bool,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if duplicate_exists {
            return Err(DomainError::validation(format!(
                "attendance already marked for this student on {}",
                cmd.attendance_date
            )));
        }
        ensure_not_future(cmd.attendance_date, today)?;
        let mut attendance = Self {
            id: AttendanceId::generate(),
            student_id: cmd.student_id,
            batch_id: cmd.batch_id,
            course_id: refs.batch.course_id,
            attendance_date: cmd.attendance_date,
            status: cmd.status,
            notes: cmd.notes.clone(),
            student_name: String::new(),
            batch_name: String::new(),
            course_name: String::new(),
            class_time: cmd.class_time.clone(),
            created_at: now,
            version: 0,
        };
        attendance.refresh_related(refs)?;
        Ok(attendance)
    }

    pub fn apply_update(&mut self, cmd: &UpdateAttendance) {
        if let Some(status) = cmd.status {
            self.status = status;
        }
        if let Some(notes) = &cmd.notes {
            self.notes = notes.clone();
        }
        if cmd.class_time.is_some() {
            self.class_time = cmd.class_time.clone();
        }
    }

    /// Copy names from the referenced records; `class_time` falls back to the
    /// batch's when unset.
    pub fn refresh_related(&mut self, refs: &AttendanceRefs<'_>) -> DomainResult<()> {
        if refs.student.id != self.student_id || refs.batch.id != self.batch_id {
            return Err(DomainError::invariant(
                "attendance references do not match the attendance",
            ));
        }
        self.student_name = refs.student.full_name.clone();
        self.batch_name = refs.batch.batch_name.clone();
        self.course_id = refs.batch.course_id;
        if let Some(course) = refs.course {
            self.course_name = course.course_name.clone();
        }
        if self.class_time.is_none() {
            self.class_time = refs.batch.class_time.clone();
        }
        Ok(())
    }

    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

impl Record for Attendance {
    type Id = AttendanceId;
    const KIND: &'static str = "attendance";

    fn id(&self) -> AttendanceId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::fixture;

    #[test]
    fn mark_copies_names_and_class_time() {
        let fx = fixture();
        let a = Attendance::mark(&fx.cmd(fx.day), &fx.refs(), false, fx.day, Utc::now()).unwrap();
        assert_eq!(a.student_name, "Quang Do");
        assert_eq!(a.course_name, "Math Olympiad");
        assert_eq!(a.class_time.as_deref(), Some("Sat 09:00"));
        assert_eq!(a.course_id, fx.course.id);
    }

    #[test]
    fn duplicate_mark_is_rejected() {
        let fx = fixture();
        let err =
            Attendance::mark(&fx.cmd(fx.day), &fx.refs(), true, fx.day, Utc::now()).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("already marked")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn future_date_is_rejected() {
        let fx = fixture();
        let tomorrow = fx.day.succ_opt().unwrap();
        let err = Attendance::mark(&fx.cmd(tomorrow), &fx.refs(), false, fx.day, Utc::now())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn roster_entry_defaults_to_present_with_empty_notes() {
        let fx = fixture();
        let json = format!("{{\"student\":\"{}\"}}", fx.student.id);
        let entry: RosterEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry.status, AttendanceStatus::Present);
        assert_eq!(entry.notes, "");
    }

    #[test]
    fn roster_result_counts_add_up() {
        let mut r = RosterResult::default();
        r.record(true);
        r.record(false);
        r.record(true);
        assert_eq!((r.created, r.updated, r.total), (2, 1, 3));
    }
}
