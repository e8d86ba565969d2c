//! Attendance domain module: one mark per (student, batch, date).

pub mod attendance;
pub mod summary;

pub use attendance::{
    ensure_not_future, Attendance, AttendanceId, AttendanceRefs, AttendanceStatus, MarkAttendance,
    RosterEntry, RosterResult, UpdateAttendance,
};
pub use summary::AttendanceSummary;
