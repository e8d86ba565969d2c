//! Rebuild paid totals from source records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tutorbook_core::DomainResult;
use tutorbook_enrollment::StudentEnrollment;

use crate::invoice::FeeInvoice;
use crate::payment::PaymentEntry;

/// Sum of paid amounts and the latest payment date over a set of sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentTotals {
    pub paid_amount: u64,
    pub last_payment_date: Option<NaiveDate>,
}

impl PaymentTotals {
    fn add(&mut self, amount: u64, date: Option<NaiveDate>) {
        self.paid_amount = self.paid_amount.saturating_add(amount);
        self.last_payment_date = self.last_payment_date.max(date);
    }

    /// Submitted entries allocated to `invoice`.
    pub fn from_payments(invoice: &FeeInvoice, payments: &[PaymentEntry]) -> Self {
        let mut totals = Self::default();
        for p in payments
            .iter()
            .filter(|p| p.invoice_id == invoice.id && p.is_submitted())
        {
            totals.add(p.paid_amount, Some(p.posting_date));
        }
        totals
    }

    /// Non-cancelled invoices of `enrollment`.
    pub fn from_invoices(enrollment: &StudentEnrollment, invoices: &[FeeInvoice]) -> Self {
        let mut totals = Self::default();
        for inv in invoices
            .iter()
            .filter(|i| i.enrollment_id == enrollment.id && !i.is_cancelled())
        {
            totals.add(inv.paid_amount, inv.last_payment_date);
        }
        totals
    }
}

/// Replace the invoice's paid amount and last payment date with the values
/// reconstructed from `payments`, then re-derive totals and statuses.
pub fn reconcile_invoice(
    invoice: &mut FeeInvoice,
    payments: &[PaymentEntry],
    today: NaiveDate,
) -> DomainResult<PaymentTotals> {
    let totals = PaymentTotals::from_payments(invoice, payments);
    invoice.paid_amount = totals.paid_amount;
    invoice.last_payment_date = totals.last_payment_date;
    invoice.recalculate(today)?;
    Ok(totals)
}

/// Same as [`reconcile_invoice`] one level up: enrollment from its invoices.
pub fn reconcile_enrollment(
    enrollment: &mut StudentEnrollment,
    invoices: &[FeeInvoice],
) -> PaymentTotals {
    let totals = PaymentTotals::from_invoices(enrollment, invoices);
    enrollment.record_payments(totals.paid_amount, totals.last_payment_date);
    totals
}
