//! Read-only reports and dashboard queries.
//!
//! Everything here reads the denormalized fields kept current by the
//! services; nothing writes.

mod attendance;
mod dashboard;
mod payments;

use serde::Serialize;

pub use attendance::{AttendanceReportFilter, AttendanceReportRow, ATTENDANCE_BANDS};
pub use dashboard::{
    CoursePopularity, DashboardData, Financial, MonthlyPayments, MonthlyRevenue, OverduePayment,
    RecentEnrollment, RevenueChart, Statistics,
};
pub use payments::{
    PaymentReportFilter, PaymentReportRow, PaymentSummary, PaymentSummaryFilter,
    PaymentTotalsSummary, StatusCount,
};

/// Column descriptor of a tabular report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportColumn {
    pub fieldname: &'static str,
    pub label: &'static str,
    pub fieldtype: &'static str,
    pub width: u32,
}

impl ReportColumn {
    const fn new(
        fieldname: &'static str,
        label: &'static str,
        fieldtype: &'static str,
        width: u32,
    ) -> Self {
        Self {
            fieldname,
            label,
            fieldtype,
            width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataset {
    pub name: &'static str,
    pub values: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub labels: Vec<&'static str>,
    pub datasets: Vec<ChartDataset>,
}

/// Single-dataset chart attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub data: ChartData,
    pub colors: Vec<&'static str>,
}

impl Chart {
    fn single(
        chart_type: ChartType,
        name: &'static str,
        buckets: Vec<(&'static str, usize)>,
        colors: &[&'static str],
    ) -> Self {
        let (labels, values) = buckets.into_iter().unzip();
        Self {
            chart_type,
            data: ChartData {
                labels,
                datasets: vec![ChartDataset { name, values }],
            },
            colors: colors.to_vec(),
        }
    }
}

/// `(columns, rows, chart)` of a tabular report.
#[derive(Debug, Clone, Serialize)]
pub struct Report<Row> {
    pub columns: Vec<ReportColumn>,
    pub rows: Vec<Row>,
    pub chart: Chart,
}
