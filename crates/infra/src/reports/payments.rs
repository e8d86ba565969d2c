use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tutorbook_catalog::{BatchId, CourseId};
use tutorbook_core::money::percentage;
use tutorbook_core::PaymentStatus;
use tutorbook_enrollment::{EnrollmentId, StudentEnrollment};
use tutorbook_students::StudentId;

use crate::services::{ServiceResult, Services};

use super::{Chart, ChartType, Report, ReportColumn};

const STATUS_COLORS: [&str; 3] = ["#28a745", "#ffc107", "#dc3545"];

const COLUMNS: [ReportColumn; 12] = [
    ReportColumn::new("student", "Student", "Link", 150),
    ReportColumn::new("student_name", "Student Name", "Data", 150),
    ReportColumn::new("course", "Course", "Link", 120),
    ReportColumn::new("course_name", "Course Name", "Data", 150),
    ReportColumn::new("batch", "Batch", "Link", 120),
    ReportColumn::new("batch_name", "Batch Name", "Data", 150),
    ReportColumn::new("enrollment_date", "Enrollment Date", "Date", 120),
    ReportColumn::new("total_fee", "Total Fee", "Currency", 120),
    ReportColumn::new("paid_amount", "Paid Amount", "Currency", 120),
    ReportColumn::new("outstanding_amount", "Outstanding Amount", "Currency", 130),
    ReportColumn::new("payment_status", "Payment Status", "Data", 120),
    ReportColumn::new("last_payment_date", "Last Payment Date", "Date", 130),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentReportFilter {
    pub student: Option<StudentId>,
    pub course: Option<CourseId>,
    pub batch: Option<BatchId>,
    pub payment_status: Option<PaymentStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub outstanding_only: bool,
}

impl PaymentReportFilter {
    fn admits(&self, e: &StudentEnrollment) -> bool {
        !e.is_cancelled()
            && self.student.is_none_or(|s| e.student_id == s)
            && self.course.is_none_or(|c| e.course_id == c)
            && self.batch.is_none_or(|b| e.batch_id == b)
            && self.payment_status.is_none_or(|p| e.payment_status == p)
            && self.from_date.is_none_or(|d| e.enrollment_date >= d)
            && self.to_date.is_none_or(|d| e.enrollment_date <= d)
            && (!self.outstanding_only || e.outstanding_amount > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReportRow {
    pub enrollment: EnrollmentId,
    pub student: StudentId,
    pub student_name: String,
    pub course: CourseId,
    pub course_name: String,
    pub batch: BatchId,
    pub batch_name: String,
    pub enrollment_date: NaiveDate,
    pub total_fee: u64,
    pub paid_amount: u64,
    pub outstanding_amount: u64,
    pub payment_status: PaymentStatus,
    pub last_payment_date: Option<NaiveDate>,
}

impl From<&StudentEnrollment> for PaymentReportRow {
    fn from(e: &StudentEnrollment) -> Self {
        Self {
            enrollment: e.id,
            student: e.student_id,
            student_name: e.student_name.clone(),
            course: e.course_id,
            course_name: e.course_name.clone(),
            batch: e.batch_id,
            batch_name: e.batch_name.clone(),
            enrollment_date: e.enrollment_date,
            total_fee: e.total_fee,
            paid_amount: e.paid_amount,
            outstanding_amount: e.outstanding_amount,
            payment_status: e.payment_status,
            last_payment_date: e.last_payment_date,
        }
    }
}

/// Enrollment counts per payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    #[serde(rename = "Paid")]
    pub paid: usize,
    #[serde(rename = "Partially Paid")]
    pub partially_paid: usize,
    #[serde(rename = "Unpaid")]
    pub unpaid: usize,
}

impl StatusCount {
    fn add(&mut self, status: PaymentStatus) {
        match status {
            PaymentStatus::Paid => self.paid += 1,
            PaymentStatus::PartiallyPaid => self.partially_paid += 1,
            PaymentStatus::Unpaid => self.unpaid += 1,
        }
    }

    fn get(&self, status: PaymentStatus) -> usize {
        match status {
            PaymentStatus::Paid => self.paid,
            PaymentStatus::PartiallyPaid => self.partially_paid,
            PaymentStatus::Unpaid => self.unpaid,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentSummaryFilter {
    pub student: Option<StudentId>,
    pub batch: Option<BatchId>,
    pub course: Option<CourseId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentTotalsSummary {
    pub total_enrollments: usize,
    pub total_fees: u64,
    pub total_paid: u64,
    pub total_outstanding: u64,
    pub payment_completion_rate: f64,
    pub status_count: StatusCount,
}

/// Matching enrollments with aggregate totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub enrollments: Vec<PaymentReportRow>,
    pub summary: PaymentTotalsSummary,
}

pub(super) fn build(
    enrollments: &[StudentEnrollment],
    filter: &PaymentReportFilter,
) -> Report<PaymentReportRow> {
    let mut rows: Vec<PaymentReportRow> = enrollments
        .iter()
        .filter(|e| filter.admits(e))
        .map(PaymentReportRow::from)
        .collect();
    rows.sort_by(|a, b| b.enrollment_date.cmp(&a.enrollment_date));

    let mut counts = StatusCount::default();
    for row in &rows {
        counts.add(row.payment_status);
    }
    let buckets = PaymentStatus::ALL
        .iter()
        .map(|status| (status.as_str(), counts.get(*status)))
        .collect();

    Report {
        columns: COLUMNS.to_vec(),
        rows,
        chart: Chart::single(ChartType::Pie, "Payment Status", buckets, &STATUS_COLORS),
    }
}

impl Services {
    /// One row per non-cancelled enrollment, newest first, with a pie of
    /// payment statuses.
    pub fn payment_report(
        &self,
        filter: &PaymentReportFilter,
    ) -> ServiceResult<Report<PaymentReportRow>> {
        let enrollments = self.store().enrollments.list()?;
        Ok(build(&enrollments, filter))
    }

    /// Totals over every enrollment matching the filter.
    pub fn payment_summary(&self, filter: &PaymentSummaryFilter) -> ServiceResult<PaymentSummary> {
        let enrollments = self.store().enrollments.find(&|e: &StudentEnrollment| {
            filter.student.is_none_or(|s| e.student_id == s)
                && filter.batch.is_none_or(|b| e.batch_id == b)
                && filter.course.is_none_or(|c| e.course_id == c)
        })?;

        let mut status_count = StatusCount::default();
        let (mut total_fees, mut total_paid, mut total_outstanding) = (0u64, 0u64, 0u64);
        for e in &enrollments {
            status_count.add(e.payment_status);
            total_fees += e.total_fee;
            total_paid += e.paid_amount;
            total_outstanding += e.outstanding_amount;
        }
        Ok(PaymentSummary {
            summary: PaymentTotalsSummary {
                total_enrollments: enrollments.len(),
                total_fees,
                total_paid,
                total_outstanding,
                payment_completion_rate: percentage(total_paid, total_fees),
                status_count,
            },
            enrollments: enrollments.iter().map(PaymentReportRow::from).collect(),
        })
    }
}
