//! Payment reminder wording.

use chrono::NaiveDate;

use crate::invoice::FeeInvoice;

/// Substring identifying a reminder communication; used for same-day dedup.
pub const REMINDER_SUBJECT_MARKER: &str = "Payment Reminder";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderMessage {
    pub subject: String,
    pub content: String,
}

impl ReminderMessage {
    fn subject(invoice: &FeeInvoice) -> String {
        format!("{REMINDER_SUBJECT_MARKER} - Invoice {}", invoice.id)
    }

    /// Message sent by the daily overdue job.
    pub fn overdue(invoice: &FeeInvoice, today: NaiveDate) -> Self {
        let content = format!(
            "Dear {name},\n\n\
             This is a friendly reminder that payment for invoice {id} is overdue.\n\n\
             Invoice Details:\n\
             - Invoice Number: {id}\n\
             - Outstanding Amount: {amount}\n\
             - Due Date: {due}\n\
             - Days Overdue: {days} days\n\n\
             Please make payment at your earliest convenience to avoid any late fees.\n\n\
             Thank you for your attention to this matter.\n",
            name = invoice.student_name,
            id = invoice.id,
            amount = format_amount(invoice.outstanding_amount),
            due = invoice.due_date,
            days = invoice.days_overdue(today),
        );
        Self {
            subject: Self::subject(invoice),
            content,
        }
    }

    /// Message sent on demand for a single invoice.
    pub fn manual(invoice: &FeeInvoice) -> Self {
        let content = format!(
            "Dear {name},\n\n\
             This is a reminder that payment for invoice {id} is due.\n\n\
             Invoice Details:\n\
             - Invoice Number: {id}\n\
             - Course: {course}\n\
             - Amount Due: {amount}\n\
             - Due Date: {due}\n\n\
             Please make payment at your earliest convenience.\n",
            name = invoice.student_name,
            id = invoice.id,
            course = invoice.course_name,
            amount = format_amount(invoice.outstanding_amount),
            due = invoice.due_date,
        );
        Self {
            subject: Self::subject(invoice),
            content,
        }
    }
}

/// `1234500` -> `"₫1,234,500"`.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("₫{grouped}")
}
