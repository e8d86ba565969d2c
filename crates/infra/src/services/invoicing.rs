use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use tutorbook_core::{DomainError, ExpectedVersion, PaymentStatus, RequestContext};
use tutorbook_enrollment::{EnrollmentId, StudentEnrollment};
use tutorbook_invoicing::{
    first_enabled_mode, reconcile_enrollment, reconcile_invoice, FeeInvoice, InvoiceId,
    InvoiceStatus, IssueInvoice, ModeOfPayment, PaymentEntry, RecordPayment, ReminderMessage,
    UpdateInvoice,
};

use crate::notify::{Communication, OutgoingMail};
use crate::store::StoreError;

use super::{require, ServiceError, ServiceResult, Services};

/// Attempts at rebuilding an enrollment's totals when a concurrent write
/// bumps its version in between.
const ENROLLMENT_RECONCILE_ATTEMPTS: usize = 5;

/// Invoice figures after a payment reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicePaymentStatus {
    pub invoice_id: InvoiceId,
    pub paid_amount: u64,
    pub outstanding_amount: u64,
    pub payment_status: PaymentStatus,
    pub status: InvoiceStatus,
    pub last_payment_date: Option<NaiveDate>,
}

impl From<&FeeInvoice> for InvoicePaymentStatus {
    fn from(invoice: &FeeInvoice) -> Self {
        Self {
            invoice_id: invoice.id,
            paid_amount: invoice.paid_amount,
            outstanding_amount: invoice.outstanding_amount,
            payment_status: invoice.payment_status,
            status: invoice.status,
            last_payment_date: invoice.last_payment_date,
        }
    }
}

/// Enrollment figures after a reconciliation against its invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentPaymentStatus {
    pub enrollment_id: EnrollmentId,
    pub total_fee: u64,
    pub paid_amount: u64,
    pub outstanding_amount: u64,
    pub payment_status: PaymentStatus,
    pub last_payment_date: Option<NaiveDate>,
}

impl From<&StudentEnrollment> for EnrollmentPaymentStatus {
    fn from(e: &StudentEnrollment) -> Self {
        Self {
            enrollment_id: e.id,
            total_fee: e.total_fee,
            paid_amount: e.paid_amount,
            outstanding_amount: e.outstanding_amount,
            payment_status: e.payment_status,
            last_payment_date: e.last_payment_date,
        }
    }
}

/// Result of applying a payment: the submitted entry and the invoice after
/// the cascade ran.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment_entry: PaymentEntry,
    pub invoice: InvoicePaymentStatus,
}

impl Services {
    pub fn create_invoice(
        &self,
        ctx: &RequestContext,
        cmd: IssueInvoice,
    ) -> ServiceResult<FeeInvoice> {
        let enrollment = require(&*self.store.enrollments, cmd.enrollment_id)?;
        let invoice = FeeInvoice::issue(&cmd, &enrollment, ctx.today(), ctx.now())?;
        let invoice = self.store.invoices.insert(invoice)?;
        info!(
            request_id = %ctx.request_id(),
            invoice = %invoice.id,
            enrollment = %invoice.enrollment_id,
            total_amount = invoice.total_amount,
            "fee invoice created"
        );
        Ok(invoice)
    }

    /// Edit dates or fees, then reconcile the invoice and its enrollment.
    pub fn update_invoice(
        &self,
        ctx: &RequestContext,
        id: InvoiceId,
        cmd: UpdateInvoice,
    ) -> ServiceResult<FeeInvoice> {
        self.invoice_locks.with(&[id], || -> ServiceResult<FeeInvoice> {
            let stored = require(&*self.store.invoices, id)?;
            let mut next = stored.clone();
            next.apply_update(&cmd, ctx.today())?;
            let saved = self.save_reconciled(ctx, next, ExpectedVersion::of(&stored))?;
            info!(request_id = %ctx.request_id(), invoice = %id, "fee invoice updated");
            self.update_enrollment_payment_status(ctx, saved.enrollment_id)?;
            Ok(saved)
        })
    }

    pub fn get_invoice(&self, id: InvoiceId) -> ServiceResult<FeeInvoice> {
        require(&*self.store.invoices, id)
    }

    /// Submitted payments of the invoice, newest posting date first.
    pub fn invoice_payment_history(&self, id: InvoiceId) -> ServiceResult<Vec<PaymentEntry>> {
        require(&*self.store.invoices, id)?;
        let mut payments = self.submitted_payments(id)?;
        payments.sort_by(|a, b| b.posting_date.cmp(&a.posting_date));
        Ok(payments)
    }

    /// Cancel the invoice; its amounts stop counting towards the enrollment.
    pub fn cancel_invoice(&self, ctx: &RequestContext, id: InvoiceId) -> ServiceResult<FeeInvoice> {
        self.invoice_locks.with(&[id], || -> ServiceResult<FeeInvoice> {
            let stored = require(&*self.store.invoices, id)?;
            let mut next = stored.clone();
            next.cancel()?;
            let saved = self.store.invoices.update(next, ExpectedVersion::of(&stored))?;
            info!(request_id = %ctx.request_id(), invoice = %id, "fee invoice cancelled");
            self.update_enrollment_payment_status(ctx, saved.enrollment_id)?;
            Ok(saved)
        })
    }

    /// Record a payment against an invoice and run the full cascade.
    ///
    /// Without an explicit mode the alphabetically first enabled mode of
    /// payment is used. The invoice lock is held from the draft to the
    /// reconciled invoice, so a submitted entry is always counted.
    pub fn apply_payment(
        &self,
        ctx: &RequestContext,
        invoice_id: InvoiceId,
        cmd: RecordPayment,
    ) -> ServiceResult<PaymentReceipt> {
        self.invoice_locks.with(&[invoice_id], || {
            self.apply_payment_locked(ctx, invoice_id, cmd)
        })
    }

    /// Pay the whole outstanding balance with a `manual` payment entry.
    pub fn mark_as_paid(
        &self,
        ctx: &RequestContext,
        id: InvoiceId,
    ) -> ServiceResult<PaymentReceipt> {
        self.invoice_locks.with(&[id], || -> ServiceResult<PaymentReceipt> {
            let invoice = require(&*self.store.invoices, id)?;
            if invoice.payment_status == PaymentStatus::Paid {
                return Err(DomainError::validation("invoice is already marked as paid").into());
            }
            invoice.ensure_accepts_payment()?;
            if invoice.outstanding_amount == 0 {
                return Err(DomainError::validation("invoice has no outstanding balance").into());
            }
            self.apply_payment_locked(
                ctx,
                id,
                RecordPayment {
                    amount: invoice.outstanding_amount,
                    posting_date: Some(ctx.today()),
                    mode_of_payment: None,
                    reference_no: Some("manual".to_string()),
                },
            )
        })
    }

    /// Rebuild the invoice's paid figures from its submitted payments, then
    /// propagate to the enrollment.
    pub fn update_invoice_payment_status(
        &self,
        ctx: &RequestContext,
        id: InvoiceId,
    ) -> ServiceResult<InvoicePaymentStatus> {
        self.invoice_locks.with(&[id], || self.reconcile_invoice_payments(ctx, id))
    }

    /// Rebuild the enrollment's paid figures from its non-cancelled invoices.
    ///
    /// Recomputing is idempotent, so a version conflict is retried against
    /// the fresh record.
    pub fn update_enrollment_payment_status(
        &self,
        ctx: &RequestContext,
        id: EnrollmentId,
    ) -> ServiceResult<EnrollmentPaymentStatus> {
        let mut attempt = 1;
        loop {
            match self.reconcile_enrollment_payments(ctx, id) {
                Err(ServiceError::Store(StoreError::Conflict(reason)))
                    if attempt < ENROLLMENT_RECONCILE_ATTEMPTS =>
                {
                    debug!(enrollment = %id, attempt, %reason, "retrying enrollment reconcile");
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    fn apply_payment_locked(
        &self,
        ctx: &RequestContext,
        invoice_id: InvoiceId,
        cmd: RecordPayment,
    ) -> ServiceResult<PaymentReceipt> {
        let invoice = require(&*self.store.invoices, invoice_id)?;
        let default_mode = match cmd.mode_of_payment {
            Some(_) => None,
            None => first_enabled_mode(&self.store.modes_of_payment.list()?),
        };
        let draft = PaymentEntry::draft(&cmd, &invoice, default_mode, ctx.today(), ctx.now())?;
        let draft = self.store.payments.insert(draft)?;
        let mut submitted = draft.clone();
        submitted.submit()?;
        let payment_entry = self
            .store
            .payments
            .update(submitted, ExpectedVersion::of(&draft))?;
        info!(
            request_id = %ctx.request_id(),
            actor = ctx.actor(),
            payment = %payment_entry.id,
            invoice = %invoice_id,
            amount = payment_entry.paid_amount,
            mode = payment_entry.mode_of_payment.as_deref().unwrap_or("-"),
            "payment entry submitted"
        );
        let invoice = self.reconcile_invoice_payments(ctx, invoice_id)?;
        Ok(PaymentReceipt {
            payment_entry,
            invoice,
        })
    }

    /// Caller holds the invoice lock.
    fn reconcile_invoice_payments(
        &self,
        ctx: &RequestContext,
        id: InvoiceId,
    ) -> ServiceResult<InvoicePaymentStatus> {
        let stored = require(&*self.store.invoices, id)?;
        let saved = self.save_reconciled(ctx, stored.clone(), ExpectedVersion::of(&stored))?;
        self.update_enrollment_payment_status(ctx, saved.enrollment_id)?;
        Ok(InvoicePaymentStatus::from(&saved))
    }

    fn reconcile_enrollment_payments(
        &self,
        ctx: &RequestContext,
        id: EnrollmentId,
    ) -> ServiceResult<EnrollmentPaymentStatus> {
        let stored = require(&*self.store.enrollments, id)?;
        let invoices = self
            .store
            .invoices
            .find(&|i: &FeeInvoice| i.enrollment_id == id)?;
        let mut next = stored.clone();
        reconcile_enrollment(&mut next, &invoices);
        if next == stored {
            return Ok(EnrollmentPaymentStatus::from(&stored));
        }
        let saved = self
            .store
            .enrollments
            .update(next, ExpectedVersion::of(&stored))?;
        info!(
            request_id = %ctx.request_id(),
            enrollment = %id,
            paid_amount = saved.paid_amount,
            payment_status = saved.payment_status.as_str(),
            "enrollment payment status updated"
        );
        Ok(EnrollmentPaymentStatus::from(&saved))
    }

    pub fn create_mode_of_payment(
        &self,
        ctx: &RequestContext,
        name: &str,
        enabled: bool,
    ) -> ServiceResult<ModeOfPayment> {
        let name = name.trim();
        if self
            .store
            .modes_of_payment
            .exists(&|m: &ModeOfPayment| m.name == name)?
        {
            let reason = format!("mode of payment {name} already exists");
            return Err(DomainError::validation(reason).into());
        }
        let mode = self.store.modes_of_payment.insert(ModeOfPayment::new(name, enabled)?)?;
        info!(
            request_id = %ctx.request_id(),
            mode = %mode.name,
            enabled,
            "mode of payment created"
        );
        Ok(mode)
    }

    /// Email the student a reminder about this invoice, sent as the caller.
    pub fn send_reminder(
        &self,
        ctx: &RequestContext,
        id: InvoiceId,
    ) -> ServiceResult<Communication> {
        let invoice = require(&*self.store.invoices, id)?;
        let student = require(&*self.store.students, invoice.student_id)?;
        let Some(email) = student.email else {
            return Err(DomainError::validation("student email not found").into());
        };
        let message = ReminderMessage::manual(&invoice);
        let mail = OutgoingMail {
            recipients: email,
            sender: ctx.actor().to_string(),
            subject: message.subject,
            content: message.content,
        };
        self.mailer.send(&mail)?;
        let communication = self
            .store
            .communications
            .insert(Communication::sent(mail, Some(id), ctx.now()))?;
        info!(
            request_id = %ctx.request_id(),
            invoice = %id,
            recipient = %communication.recipients,
            "payment reminder sent"
        );
        Ok(communication)
    }

    fn submitted_payments(&self, invoice: InvoiceId) -> ServiceResult<Vec<PaymentEntry>> {
        Ok(self
            .store
            .payments
            .find(&|p: &PaymentEntry| p.invoice_id == invoice && p.is_submitted())?)
    }

    /// Fill unset fees from the enrollment, rebuild paid figures from the
    /// submitted payments and persist.
    fn save_reconciled(
        &self,
        ctx: &RequestContext,
        mut invoice: FeeInvoice,
        expected: ExpectedVersion,
    ) -> ServiceResult<FeeInvoice> {
        if let Some(enrollment) = self.store.enrollments.get(invoice.enrollment_id)? {
            invoice.sync_from_enrollment(&enrollment);
        }
        let payments = self.submitted_payments(invoice.id)?;
        reconcile_invoice(&mut invoice, &payments, ctx.today())?;
        Ok(self.store.invoices.update(invoice, expected)?)
    }
}
