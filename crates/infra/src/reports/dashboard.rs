use std::collections::BTreeMap;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::Serialize;

use tutorbook_catalog::{Batch, BatchId, BatchStatus, Course, CourseId, CourseStatus};
use tutorbook_core::money::percentage;
use tutorbook_core::{PaymentStatus, RequestContext};
use tutorbook_enrollment::{EnrollmentId, StudentEnrollment};
use tutorbook_invoicing::{FeeInvoice, InvoiceId, InvoiceStatus};
use tutorbook_students::{Student, StudentId, StudentStatus};

use crate::services::{ServiceResult, Services};

const RECENT_LIMIT: usize = 5;
const POPULAR_LIMIT: usize = 10;

/// Counts of Active records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_students: usize,
    pub total_courses: usize,
    pub total_batches: usize,
    pub total_enrollments: usize,
}

/// Fee totals over non-cancelled enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Financial {
    pub total_revenue: u64,
    pub total_paid: u64,
    pub total_outstanding: u64,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEnrollment {
    pub enrollment: EnrollmentId,
    pub student: StudentId,
    pub student_name: String,
    pub course: CourseId,
    pub course_name: String,
    pub batch: BatchId,
    pub batch_name: String,
    pub enrollment_date: NaiveDate,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverduePayment {
    pub invoice: InvoiceId,
    pub student: StudentId,
    pub student_name: String,
    pub outstanding_amount: u64,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub statistics: Statistics,
    pub financial: Financial,
    /// Enrollment count per payment status; statuses without enrollments are absent.
    pub payment_status_distribution: BTreeMap<&'static str, usize>,
    pub recent_enrollments: Vec<RecentEnrollment>,
    pub overdue_payments: Vec<OverduePayment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPayments {
    pub month: String,
    pub payments: u64,
}

/// Fee and paid totals of enrollments grouped by creation month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueChart {
    pub revenue: Vec<MonthlyRevenue>,
    pub payments: Vec<MonthlyPayments>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoursePopularity {
    pub course: CourseId,
    pub course_name: String,
    pub enrollment_count: usize,
}

impl Services {
    pub fn dashboard(&self, ctx: &RequestContext) -> ServiceResult<DashboardData> {
        let store = self.store();
        let statistics = Statistics {
            total_students: store.students.count(&|s: &Student| s.status == StudentStatus::Active)?,
            total_courses: store.courses.count(&|c: &Course| c.status == CourseStatus::Active)?,
            total_batches: store.batches.count(&|b: &Batch| b.status == BatchStatus::Active)?,
            total_enrollments: store.enrollments.count(&StudentEnrollment::is_active)?,
        };

        let mut enrollments = store
            .enrollments
            .find(&|e: &StudentEnrollment| !e.is_cancelled())?;
        let (mut total_revenue, mut total_paid, mut total_outstanding) = (0u64, 0u64, 0u64);
        let mut payment_status_distribution = BTreeMap::new();
        for e in &enrollments {
            total_revenue += e.total_fee;
            total_paid += e.paid_amount;
            total_outstanding += e.outstanding_amount;
            *payment_status_distribution
                .entry(e.payment_status.as_str())
                .or_insert(0) += 1;
        }

        enrollments.sort_by(|a, b| b.enrollment_date.cmp(&a.enrollment_date));
        let recent_enrollments = enrollments
            .iter()
            .take(RECENT_LIMIT)
            .map(|e| RecentEnrollment {
                enrollment: e.id,
                student: e.student_id,
                student_name: e.student_name.clone(),
                course: e.course_id,
                course_name: e.course_name.clone(),
                batch: e.batch_id,
                batch_name: e.batch_name.clone(),
                enrollment_date: e.enrollment_date,
                payment_status: e.payment_status,
            })
            .collect();

        let mut overdue = store.invoices.find(&|i: &FeeInvoice| {
            i.status == InvoiceStatus::Overdue && i.outstanding_amount > 0
        })?;
        overdue.sort_by_key(|i| i.due_date);
        let overdue_payments = overdue
            .iter()
            .take(RECENT_LIMIT)
            .map(|i| OverduePayment {
                invoice: i.id,
                student: i.student_id,
                student_name: i.student_name.clone(),
                outstanding_amount: i.outstanding_amount,
                due_date: i.due_date,
                days_overdue: i.days_overdue(ctx.today()),
            })
            .collect();

        Ok(DashboardData {
            statistics,
            financial: Financial {
                total_revenue,
                total_paid,
                total_outstanding,
                collection_rate: percentage(total_paid, total_revenue),
            },
            payment_status_distribution,
            recent_enrollments,
            overdue_payments,
        })
    }

    /// Monthly series over enrollments created in the last `months` months.
    pub fn revenue_chart(&self, ctx: &RequestContext, months: u32) -> ServiceResult<RevenueChart> {
        let since = ctx
            .now()
            .checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let enrollments = self
            .store()
            .enrollments
            .find(&|e: &StudentEnrollment| !e.is_cancelled() && e.created_at >= since)?;

        let mut by_month: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for e in &enrollments {
            let totals = by_month
                .entry(e.created_at.format("%Y-%m").to_string())
                .or_default();
            totals.0 += e.total_fee;
            totals.1 += e.paid_amount;
        }
        Ok(RevenueChart {
            revenue: by_month
                .iter()
                .map(|(month, (revenue, _))| MonthlyRevenue {
                    month: month.clone(),
                    revenue: *revenue,
                })
                .collect(),
            payments: by_month
                .into_iter()
                .map(|(month, (_, payments))| MonthlyPayments { month, payments })
                .collect(),
        })
    }

    /// Top courses by non-cancelled enrollment count, courses without
    /// enrollments included.
    pub fn course_popularity(&self) -> ServiceResult<Vec<CoursePopularity>> {
        let enrollments = self
            .store()
            .enrollments
            .find(&|e: &StudentEnrollment| !e.is_cancelled())?;
        let mut counts: BTreeMap<CourseId, usize> = BTreeMap::new();
        for e in &enrollments {
            *counts.entry(e.course_id).or_default() += 1;
        }

        let mut popularity: Vec<_> = self
            .store()
            .courses
            .list()?
            .into_iter()
            .map(|c| CoursePopularity {
                enrollment_count: counts.get(&c.id).copied().unwrap_or(0),
                course: c.id,
                course_name: c.course_name,
            })
            .collect();
        popularity.sort_by(|a, b| {
            b.enrollment_count
                .cmp(&a.enrollment_count)
                .then_with(|| a.course_name.cmp(&b.course_name))
        });
        popularity.truncate(POPULAR_LIMIT);
        Ok(popularity)
    }
}

#[cfg(test)]
mod tests {
    use tutorbook_enrollment::EnrollStudent;

    use super::*;
    use crate::testkit::{at, batch, course, d, services, student};

    #[test]
    fn dashboard_counts_totals_and_overdue() {
        let s = services();
        let ctx = at(2024, 3, 1);
        let c = course(&s, &ctx, 1_000_000);
        let b = batch(&s, &ctx, &c, None);
        for (i, name) in ["An", "Binh", "Chi"].into_iter().enumerate() {
            let st = student(&s, &ctx, name, Some("family@example.com"));
            s.enroll(
                &ctx,
                EnrollStudent {
                    student_id: st.id,
                    batch_id: b.id,
                    enrollment_date: Some(d(2024, 3, 1 + i as u32)),
                    discount_amount: 0,
                },
            )
            .unwrap();
        }
        let later = at(2024, 3, 20);
        s.send_payment_reminders(&later).unwrap();

        let data = s.dashboard(&later).unwrap();
        assert_eq!(data.statistics.total_students, 3);
        assert_eq!(data.statistics.total_enrollments, 3);
        assert_eq!(data.financial.total_revenue, 3_000_000);
        assert_eq!(data.financial.collection_rate, 0.0);
        assert_eq!(data.payment_status_distribution.get("Unpaid"), Some(&3));
        assert_eq!(data.recent_enrollments[0].enrollment_date, d(2024, 3, 3));
        assert_eq!(data.overdue_payments.len(), 3);
        assert_eq!(data.overdue_payments[0].due_date, d(2024, 3, 1));
        assert_eq!(data.overdue_payments[0].days_overdue, 19);
    }

    #[test]
    fn popularity_includes_courses_without_enrollments() {
        let s = services();
        let ctx = at(2024, 3, 1);
        let popular = course(&s, &ctx, 500_000);
        let quiet = course(&s, &ctx, 700_000);
        let b = batch(&s, &ctx, &popular, None);
        let st = student(&s, &ctx, "An", None);
        s.enroll(
            &ctx,
            EnrollStudent {
                student_id: st.id,
                batch_id: b.id,
                enrollment_date: None,
                discount_amount: 0,
            },
        )
        .unwrap();

        let ranking = s.course_popularity().unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].course, popular.id);
        assert_eq!(ranking[0].enrollment_count, 1);
        assert_eq!(ranking[1].course, quiet.id);
        assert_eq!(ranking[1].enrollment_count, 0);
    }

    #[test]
    fn revenue_chart_groups_by_creation_month() {
        let s = services();
        let setup = at(2024, 1, 10);
        let c = course(&s, &setup, 1_000_000);
        let b = batch(&s, &setup, &c, None);
        for (month, name) in [(1, "An"), (2, "Binh"), (2, "Chi")] {
            let ctx = at(2024, month, 15);
            let st = student(&s, &ctx, name, None);
            s.enroll(
                &ctx,
                EnrollStudent {
                    student_id: st.id,
                    batch_id: b.id,
                    enrollment_date: None,
                    discount_amount: 0,
                },
            )
            .unwrap();
        }

        let chart = s.revenue_chart(&at(2024, 3, 1), 6).unwrap();
        assert_eq!(
            chart.revenue,
            vec![
                MonthlyRevenue { month: "2024-01".into(), revenue: 1_000_000 },
                MonthlyRevenue { month: "2024-02".into(), revenue: 2_000_000 },
            ]
        );
        assert_eq!(chart.payments[1], MonthlyPayments { month: "2024-02".into(), payments: 0 });

        let recent = s.revenue_chart(&at(2024, 3, 1), 1).unwrap();
        assert_eq!(recent.revenue.len(), 1);
    }
}
