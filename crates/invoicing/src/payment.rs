use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tutorbook_core::{DomainError, DomainResult, Record};
use tutorbook_students::StudentId;

use crate::invoice::{FeeInvoice, InvoiceId};

tutorbook_core::record_id!(PaymentEntryId, "PaymentEntryId");

/// Only `Submitted` entries count towards paid totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentState {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

/// A received payment allocated in full to one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub id: PaymentEntryId,
    pub invoice_id: InvoiceId,
    pub party: StudentId,
    pub posting_date: NaiveDate,
    pub paid_amount: u64,
    pub mode_of_payment: Option<String>,
    pub reference_no: Option<String>,
    pub state: PaymentState,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Command: RecordPayment (`create_payment_entry_for_invoice`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub amount: u64,
    /// Defaults to the request's date.
    pub posting_date: Option<NaiveDate>,
    /// Defaults to the first enabled mode of payment.
    pub mode_of_payment: Option<String>,
    pub reference_no: Option<String>,
}

impl PaymentEntry {
    /// Draft entry against `invoice`; the caller submits it once stored.
    pub fn draft(
        cmd: &RecordPayment,
        invoice: &FeeInvoice,
        default_mode: Option<String>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cmd.amount == 0 {
            return Err(DomainError::validation("paid amount must be greater than zero"));
        }
        invoice.ensure_accepts_payment()?;
        Ok(Self {
            id: PaymentEntryId::generate(),
            invoice_id: invoice.id,
            party: invoice.student_id,
            posting_date: cmd.posting_date.unwrap_or(today),
            paid_amount: cmd.amount,
            mode_of_payment: cmd.mode_of_payment.clone().or(default_mode),
            reference_no: cmd.reference_no.clone(),
            state: PaymentState::Draft,
            created_at: now,
            version: 0,
        })
    }

    pub fn submit(&mut self) -> DomainResult<()> {
        match self.state {
            PaymentState::Draft => {
                self.state = PaymentState::Submitted;
                Ok(())
            }
            other => Err(DomainError::conflict(format!(
                "payment entry in state {other:?} cannot be submitted"
            ))),
        }
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        match self.state {
            PaymentState::Submitted => {
                self.state = PaymentState::Cancelled;
                Ok(())
            }
            other => Err(DomainError::conflict(format!(
                "payment entry in state {other:?} cannot be cancelled"
            ))),
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.state == PaymentState::Submitted
    }
}

impl Record for PaymentEntry {
    type Id = PaymentEntryId;
    const KIND: &'static str = "payment entry";

    fn id(&self) -> PaymentEntryId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
