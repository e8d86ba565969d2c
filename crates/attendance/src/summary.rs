use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tutorbook_core::money::round2;

use crate::attendance::{Attendance, AttendanceStatus};

/// Session counts and attendance rate over a set of marks.
///
/// `attendance_rate` counts only `Present` as attended.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_sessions: usize,
    pub attended_sessions: usize,
    pub absent_sessions: usize,
    pub late_sessions: usize,
    pub excused_sessions: usize,
    pub attendance_rate: f64,
}

impl AttendanceSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Attendance>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.add(record.status);
        }
        summary.finish()
    }

    /// Running summary up to and including `until`.
    pub fn until<'a>(records: impl IntoIterator<Item = &'a Attendance>, until: NaiveDate) -> Self {
        Self::from_records(records.into_iter().filter(|r| r.attendance_date <= until))
    }

    pub fn add(&mut self, status: AttendanceStatus) {
        self.total_sessions += 1;
        match status {
            AttendanceStatus::Present => self.attended_sessions += 1,
            AttendanceStatus::Absent => self.absent_sessions += 1,
            AttendanceStatus::Late => self.late_sessions += 1,
            AttendanceStatus::Excused => self.excused_sessions += 1,
        }
    }

    pub fn finish(mut self) -> Self {
        self.attendance_rate = rate(self.attended_sessions, self.total_sessions);
        self
    }
}

/// `attended / total * 100` rounded to 2 decimals, 0 for no sessions.
pub fn rate(attended: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(attended as f64 / total as f64 * 100.0)
    }
}
