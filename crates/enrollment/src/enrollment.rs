use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tutorbook_catalog::{Batch, BatchId, Course, CourseId};
use tutorbook_core::money::{net_amount, outstanding};
use tutorbook_core::{DomainError, DomainResult, PaymentStatus, Record};
use tutorbook_students::{Student, StudentId};

use crate::rules::{ensure_capacity, ensure_enrollment_date, ensure_not_duplicate};

tutorbook_core::record_id!(EnrollmentId, "EnrollmentId");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    Dropped,
    Cancelled,
}

/// Records an enrollment reads its names, course and fee from.
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentRefs<'a> {
    pub student: &'a Student,
    pub batch: &'a Batch,
    pub course: &'a Course,
}

/// A student's seat in a batch together with its fee and payment state.
///
/// `paid_amount` is never edited directly: it is the sum of the paid amounts
/// of the enrollment's non-cancelled invoices (see [`StudentEnrollment::record_payments`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEnrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub batch_id: BatchId,
    pub course_id: CourseId,
    pub student_name: String,
    pub course_name: String,
    pub batch_name: String,
    pub enrollment_date: NaiveDate,
    pub course_fee: u64,
    pub discount_amount: u64,
    pub total_fee: u64,
    pub paid_amount: u64,
    pub outstanding_amount: u64,
    pub payment_status: PaymentStatus,
    pub status: EnrollmentStatus,
    pub last_payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Command: EnrollStudent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollStudent {
    pub student_id: StudentId,
    pub batch_id: BatchId,
    /// Defaults to the request's date.
    pub enrollment_date: Option<NaiveDate>,
    #[serde(default)]
    pub discount_amount: u64,
}

/// Command: UpdateEnrollment. `None` keeps the existing value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateEnrollment {
    pub batch_id: Option<BatchId>,
    pub enrollment_date: Option<NaiveDate>,
    pub discount_amount: Option<u64>,
    pub status: Option<EnrollmentStatus>,
}

impl StudentEnrollment {
    /// New Active enrollment, not yet admitted (see [`Self::admit`]).
    pub fn new(
        cmd: &EnrollStudent,
        refs: &EnrollmentRefs<'_>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        let mut enrollment = Self {
            id: EnrollmentId::generate(),
            student_id: cmd.student_id,
            batch_id: cmd.batch_id,
            course_id: refs.batch.course_id,
            student_name: String::new(),
            course_name: String::new(),
            batch_name: String::new(),
            enrollment_date: cmd.enrollment_date.unwrap_or(today),
            course_fee: refs.course.course_fee,
            discount_amount: cmd.discount_amount,
            total_fee: 0,
            paid_amount: 0,
            outstanding_amount: 0,
            payment_status: PaymentStatus::Unpaid,
            status: EnrollmentStatus::Active,
            last_payment_date: None,
            created_at: now,
            version: 0,
        };
        enrollment.refresh_names(refs);
        enrollment
    }

    /// Field changes only; the result still has to pass [`Self::admit`].
    pub fn apply_update(&mut self, cmd: &UpdateEnrollment) {
        if let Some(batch_id) = cmd.batch_id {
            self.batch_id = batch_id;
        }
        if let Some(date) = cmd.enrollment_date {
            self.enrollment_date = date;
        }
        if let Some(discount) = cmd.discount_amount {
            self.discount_amount = discount;
        }
        if let Some(status) = cmd.status {
            self.status = status;
        }
    }

    /// Run every admission rule and re-derive fees and payment status.
    ///
    /// `siblings` are the stored enrollments of the same student in the same
    /// batch. `previous` is the stored state when this is an update.
    pub fn admit(
        &mut self,
        refs: &EnrollmentRefs<'_>,
        siblings: &[StudentEnrollment],
        previous: Option<&StudentEnrollment>,
    ) -> DomainResult<()> {
        if refs.batch.id != self.batch_id || refs.student.id != self.student_id {
            return Err(DomainError::invariant(
                "enrollment references do not match the enrollment",
            ));
        }
        ensure_not_duplicate(self, siblings)?;
        if self.becomes_active(previous) {
            ensure_capacity(refs.batch)?;
        }
        ensure_enrollment_date(self.enrollment_date, refs.batch)?;
        self.course_id = refs.batch.course_id;
        self.calculate_fees(refs.course.course_fee)?;
        self.update_payment_status();
        self.refresh_names(refs);
        Ok(())
    }

    /// True when this save adds a seat to `batch_id`.
    pub fn becomes_active(&self, previous: Option<&StudentEnrollment>) -> bool {
        self.status == EnrollmentStatus::Active
            && previous.is_none_or(|p| {
                p.status != EnrollmentStatus::Active || p.batch_id != self.batch_id
            })
    }

    pub fn calculate_fees(&mut self, course_fee: u64) -> DomainResult<()> {
        self.course_fee = course_fee;
        self.total_fee = net_amount(course_fee, self.discount_amount)?;
        self.outstanding_amount = outstanding(self.total_fee, self.paid_amount);
        Ok(())
    }

    pub fn update_payment_status(&mut self) {
        self.payment_status = PaymentStatus::derive(self.total_fee, self.paid_amount);
    }

    /// Replace paid totals with values reconstructed from invoices.
    pub fn record_payments(&mut self, paid_amount: u64, last_payment_date: Option<NaiveDate>) {
        self.paid_amount = paid_amount;
        self.last_payment_date = last_payment_date;
        self.outstanding_amount = outstanding(self.total_fee, paid_amount);
        self.update_payment_status();
    }

    pub fn refresh_names(&mut self, refs: &EnrollmentRefs<'_>) {
        self.student_name = refs.student.full_name.clone();
        self.course_name = refs.course.course_name.clone();
        self.batch_name = refs.batch.batch_name.clone();
    }

    /// Whether the post-save cascade should issue a fee invoice.
    pub fn needs_invoice(&self) -> bool {
        self.status == EnrollmentStatus::Active
            && self.payment_status == PaymentStatus::Unpaid
            && self.total_fee > 0
    }

    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == EnrollmentStatus::Cancelled
    }
}

impl Record for StudentEnrollment {
    type Id = EnrollmentId;
    const KIND: &'static str = "student enrollment";

    fn id(&self) -> EnrollmentId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
