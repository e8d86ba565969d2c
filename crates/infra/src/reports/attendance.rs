use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tutorbook_attendance::{Attendance, AttendanceSummary};
use tutorbook_catalog::{BatchId, CourseId};
use tutorbook_students::StudentId;

use crate::services::{ServiceResult, Services};

use super::{Chart, ChartType, Report, ReportColumn};

/// Lower bound (inclusive) and label of each attendance-rate band.
pub const ATTENDANCE_BANDS: [(f64, &str); 5] = [
    (90.0, "90-100%"),
    (80.0, "80-89%"),
    (70.0, "70-79%"),
    (60.0, "60-69%"),
    (f64::NEG_INFINITY, "Below 60%"),
];

const BAND_COLORS: [&str; 5] = ["#28a745", "#20c997", "#ffc107", "#fd7e14", "#dc3545"];

const COLUMNS: [ReportColumn; 12] = [
    ReportColumn::new("student", "Student", "Link", 150),
    ReportColumn::new("student_name", "Student Name", "Data", 150),
    ReportColumn::new("batch", "Batch", "Link", 120),
    ReportColumn::new("batch_name", "Batch Name", "Data", 150),
    ReportColumn::new("course", "Course", "Link", 120),
    ReportColumn::new("course_name", "Course Name", "Data", 150),
    ReportColumn::new("total_sessions", "Total Sessions", "Int", 120),
    ReportColumn::new("present_sessions", "Present", "Int", 100),
    ReportColumn::new("absent_sessions", "Absent", "Int", 100),
    ReportColumn::new("late_sessions", "Late", "Int", 100),
    ReportColumn::new("excused_sessions", "Excused", "Int", 100),
    ReportColumn::new("attendance_rate", "Attendance Rate %", "Percent", 130),
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttendanceReportFilter {
    pub student: Option<StudentId>,
    pub batch: Option<BatchId>,
    pub course: Option<CourseId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// Applied to the aggregated rate of each row.
    pub min_attendance_rate: Option<f64>,
}

impl AttendanceReportFilter {
    fn admits(&self, a: &Attendance) -> bool {
        self.student.is_none_or(|s| a.student_id == s)
            && self.batch.is_none_or(|b| a.batch_id == b)
            && self.course.is_none_or(|c| a.course_id == c)
            && self.from_date.is_none_or(|d| a.attendance_date >= d)
            && self.to_date.is_none_or(|d| a.attendance_date <= d)
    }
}

/// Attendance of one student in one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReportRow {
    pub student: StudentId,
    pub student_name: String,
    pub batch: BatchId,
    pub batch_name: String,
    pub course: CourseId,
    pub course_name: String,
    pub total_sessions: usize,
    pub present_sessions: usize,
    pub absent_sessions: usize,
    pub late_sessions: usize,
    pub excused_sessions: usize,
    pub attendance_rate: f64,
}

impl AttendanceReportRow {
    fn new(first: &Attendance, summary: AttendanceSummary) -> Self {
        Self {
            student: first.student_id,
            student_name: first.student_name.clone(),
            batch: first.batch_id,
            batch_name: first.batch_name.clone(),
            course: first.course_id,
            course_name: first.course_name.clone(),
            total_sessions: summary.total_sessions,
            present_sessions: summary.attended_sessions,
            absent_sessions: summary.absent_sessions,
            late_sessions: summary.late_sessions,
            excused_sessions: summary.excused_sessions,
            attendance_rate: summary.attendance_rate,
        }
    }
}

pub(super) fn build(
    marks: &[Attendance],
    filter: &AttendanceReportFilter,
) -> Report<AttendanceReportRow> {
    let mut groups: BTreeMap<(StudentId, BatchId, CourseId), (&Attendance, AttendanceSummary)> =
        BTreeMap::new();
    for mark in marks.iter().filter(|a| filter.admits(a)) {
        groups
            .entry((mark.student_id, mark.batch_id, mark.course_id))
            .or_insert_with(|| (mark, AttendanceSummary::default()))
            .1
            .add(mark.status);
    }

    let mut rows: Vec<_> = groups
        .into_values()
        .map(|(first, summary)| AttendanceReportRow::new(first, summary.finish()))
        .filter(|row| filter.min_attendance_rate.is_none_or(|min| row.attendance_rate >= min))
        .collect();
    rows.sort_by(|a, b| {
        b.attendance_rate
            .total_cmp(&a.attendance_rate)
            .then_with(|| a.student_name.cmp(&b.student_name))
    });

    let mut bands = ATTENDANCE_BANDS.map(|(_, label)| (label, 0usize));
    for row in &rows {
        if let Some(i) = ATTENDANCE_BANDS
            .iter()
            .position(|(floor, _)| row.attendance_rate >= *floor)
        {
            bands[i].1 += 1;
        }
    }

    Report {
        columns: COLUMNS.to_vec(),
        rows,
        chart: Chart::single(ChartType::Bar, "Students", bands.to_vec(), &BAND_COLORS),
    }
}

impl Services {
    /// Per (student, batch, course) attendance with a rate-band chart.
    pub fn attendance_report(
        &self,
        filter: &AttendanceReportFilter,
    ) -> ServiceResult<Report<AttendanceReportRow>> {
        let marks = self.store().attendance.list()?;
        Ok(build(&marks, filter))
    }
}
