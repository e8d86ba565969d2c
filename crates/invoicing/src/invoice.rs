use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tutorbook_catalog::{BatchId, CourseId};
use tutorbook_core::money::{net_amount, outstanding};
use tutorbook_core::{DomainError, DomainResult, PaymentStatus, Record};
use tutorbook_enrollment::{EnrollmentId, StudentEnrollment};
use tutorbook_students::StudentId;

tutorbook_core::record_id!(InvoiceId, "InvoiceId");

/// Invoice status lifecycle.
///
/// Everything except `Cancelled` is derived from the payment status and the
/// due date; `Cancelled` is set explicitly and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Submitted,
    Paid,
    Overdue,
    Cancelled,
}

/// Billable document derived from one enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInvoice {
    pub id: InvoiceId,
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub batch_id: BatchId,
    pub student_name: String,
    pub course_name: String,
    pub batch_name: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub course_fee: u64,
    pub discount_amount: u64,
    pub total_amount: u64,
    pub paid_amount: u64,
    pub outstanding_amount: u64,
    pub payment_status: PaymentStatus,
    pub status: InvoiceStatus,
    pub last_payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Command: IssueInvoice.
///
/// Dates default to the enrollment date; fee fields left at 0 (or absent) are
/// filled from the enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInvoice {
    pub enrollment_id: EnrollmentId,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub course_fee: u64,
    #[serde(default)]
    pub discount_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateInvoice {
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub course_fee: Option<u64>,
    pub discount_amount: Option<u64>,
}

impl FeeInvoice {
    /// Invoice issued by the enrollment cascade: dated on the enrollment date,
    /// fees copied from the enrollment.
    pub fn for_enrollment(
        enrollment: &StudentEnrollment,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Self::issue(
            &IssueInvoice {
                enrollment_id: enrollment.id,
                invoice_date: None,
                due_date: None,
                course_fee: 0,
                discount_amount: 0,
            },
            enrollment,
            today,
            now,
        )
    }

    pub fn issue(
        cmd: &IssueInvoice,
        enrollment: &StudentEnrollment,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cmd.enrollment_id != enrollment.id {
            return Err(DomainError::invariant(
                "invoice must be issued against the given enrollment",
            ));
        }
        let mut invoice = Self {
            id: InvoiceId::generate(),
            enrollment_id: enrollment.id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            batch_id: enrollment.batch_id,
            student_name: String::new(),
            course_name: String::new(),
            batch_name: String::new(),
            invoice_date: cmd.invoice_date.unwrap_or(enrollment.enrollment_date),
            due_date: cmd.due_date.unwrap_or(enrollment.enrollment_date),
            course_fee: cmd.course_fee,
            discount_amount: cmd.discount_amount,
            total_amount: 0,
            paid_amount: 0,
            outstanding_amount: 0,
            payment_status: PaymentStatus::Unpaid,
            status: InvoiceStatus::Draft,
            last_payment_date: None,
            created_at: now,
            version: 0,
        };
        invoice.sync_from_enrollment(enrollment);
        invoice.recalculate(today)?;
        Ok(invoice)
    }

    pub fn apply_update(&mut self, cmd: &UpdateInvoice, today: NaiveDate) -> DomainResult<()> {
        if self.is_cancelled() {
            return Err(DomainError::conflict("cancelled invoice cannot be edited"));
        }
        let mut next = self.clone();
        if let Some(date) = cmd.invoice_date {
            next.invoice_date = date;
        }
        if let Some(date) = cmd.due_date {
            next.due_date = date;
        }
        if let Some(fee) = cmd.course_fee {
            next.course_fee = fee;
        }
        if let Some(discount) = cmd.discount_amount {
            next.discount_amount = discount;
        }
        next.recalculate(today)?;
        *self = next;
        Ok(())
    }

    /// Pull ids and names from the enrollment; fees only when still unset.
    pub fn sync_from_enrollment(&mut self, enrollment: &StudentEnrollment) {
        self.student_id = enrollment.student_id;
        self.course_id = enrollment.course_id;
        self.batch_id = enrollment.batch_id;
        self.student_name = enrollment.student_name.clone();
        self.course_name = enrollment.course_name.clone();
        self.batch_name = enrollment.batch_name.clone();
        if self.course_fee == 0 {
            self.course_fee = enrollment.course_fee;
        }
        if self.discount_amount == 0 {
            self.discount_amount = enrollment.discount_amount;
        }
    }

    /// Validate dates and fees, then re-derive totals and both statuses.
    pub fn recalculate(&mut self, today: NaiveDate) -> DomainResult<()> {
        if self.invoice_date > self.due_date {
            return Err(DomainError::validation(
                "due date cannot be before invoice date",
            ));
        }
        if self.course_fee == 0 {
            return Err(DomainError::validation("course fee must be greater than zero"));
        }
        self.total_amount = net_amount(self.course_fee, self.discount_amount)?;
        self.outstanding_amount = outstanding(self.total_amount, self.paid_amount);
        self.payment_status = PaymentStatus::derive(self.total_amount, self.paid_amount);
        self.refresh_status(today);
        Ok(())
    }

    pub fn refresh_status(&mut self, today: NaiveDate) {
        if self.is_cancelled() {
            return;
        }
        self.status = if self.payment_status == PaymentStatus::Paid {
            InvoiceStatus::Paid
        } else if self.due_date < today {
            InvoiceStatus::Overdue
        } else {
            InvoiceStatus::Submitted
        };
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.is_cancelled() {
            return Err(DomainError::conflict("invoice is already cancelled"));
        }
        self.status = InvoiceStatus::Cancelled;
        Ok(())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == InvoiceStatus::Cancelled
    }

    pub fn ensure_accepts_payment(&self) -> DomainResult<()> {
        if self.is_cancelled() {
            return Err(DomainError::validation(
                "cannot record a payment against a cancelled invoice",
            ));
        }
        Ok(())
    }

    /// Whole days past the due date, 0 when not yet due.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days().max(0)
    }

    /// Candidate for the reminder job.
    pub fn is_overdue_with_balance(&self) -> bool {
        self.status == InvoiceStatus::Overdue && self.outstanding_amount > 0
    }
}

impl Record for FeeInvoice {
    type Id = InvoiceId;
    const KIND: &'static str = "fee invoice";

    fn id(&self) -> InvoiceId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
