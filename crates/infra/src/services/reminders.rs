use serde::Serialize;
use tracing::{info, warn};

use tutorbook_core::{ExpectedVersion, RequestContext};
use tutorbook_invoicing::{FeeInvoice, InvoiceStatus, ReminderMessage};

use crate::notify::{Communication, OutgoingMail};

use super::{ServiceResult, Services};

/// Name the daily reminder job is registered under.
pub const SEND_PAYMENT_REMINDERS: &str = "send_payment_reminders";

/// Counters of one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRun {
    /// Invoices whose status moved to `Overdue` during this run.
    pub marked_overdue: usize,
    pub reminders_sent: usize,
    pub skipped_no_email: usize,
    pub skipped_already_reminded: usize,
    pub failed: usize,
}

impl Services {
    /// Email every student holding an overdue invoice with a balance.
    ///
    /// Invoice statuses are refreshed against today first. At most one
    /// reminder per invoice per day is recorded; a failed send is logged and
    /// leaves no communication behind.
    pub fn send_payment_reminders(&self, ctx: &RequestContext) -> ServiceResult<ReminderRun> {
        let today = ctx.today();
        let mut run = ReminderRun {
            marked_overdue: self.refresh_overdue(ctx)?,
            ..ReminderRun::default()
        };

        let overdue = self
            .store
            .invoices
            .find(&|i: &FeeInvoice| i.is_overdue_with_balance())?;
        for invoice in overdue {
            let Some(student) = self.store.students.get(invoice.student_id)? else {
                warn!(invoice = %invoice.id, "student missing for overdue invoice");
                run.skipped_no_email += 1;
                continue;
            };
            let Some(email) = student.email else {
                run.skipped_no_email += 1;
                continue;
            };
            let id = invoice.id;
            if self
                .store
                .communications
                .exists(&|c: &Communication| c.is_reminder_for(id, today))?
            {
                run.skipped_already_reminded += 1;
                continue;
            }

            let message = ReminderMessage::overdue(&invoice, today);
            let mail = OutgoingMail {
                recipients: email,
                sender: self.reminder_sender.clone(),
                subject: message.subject,
                content: message.content,
            };
            if let Err(err) = self.mailer.send(&mail) {
                warn!(
                    invoice = %id,
                    recipient = %mail.recipients,
                    error = %err,
                    "payment reminder failed"
                );
                run.failed += 1;
                continue;
            }
            self.store
                .communications
                .insert(Communication::sent(mail, Some(id), ctx.now()))?;
            run.reminders_sent += 1;
        }

        info!(
            request_id = %ctx.request_id(),
            sent = run.reminders_sent,
            marked_overdue = run.marked_overdue,
            failed = run.failed,
            "payment reminders processed"
        );
        Ok(run)
    }

    /// Re-derive the status of every open invoice whose due date has passed.
    fn refresh_overdue(&self, ctx: &RequestContext) -> ServiceResult<usize> {
        let today = ctx.today();
        let stale = self.store.invoices.find(&|i: &FeeInvoice| {
            !i.is_cancelled()
                && i.status != InvoiceStatus::Overdue
                && i.outstanding_amount > 0
                && i.due_date < today
        })?;
        let mut marked = 0;
        for candidate in stale {
            let id = candidate.id;
            let changed = self.invoice_locks.with(&[id], || -> ServiceResult<bool> {
                let Some(stored) = self.store.invoices.get(id)? else {
                    return Ok(false);
                };
                let mut next = stored.clone();
                next.refresh_status(today);
                if next.status == stored.status {
                    return Ok(false);
                }
                self.store
                    .invoices
                    .update(next, ExpectedVersion::of(&stored))?;
                Ok(true)
            })?;
            if changed {
                marked += 1;
            }
        }
        Ok(marked)
    }
}
