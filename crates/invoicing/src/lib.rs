//! Invoicing domain module: fee invoices, payment entries and modes of payment.
//!
//! Paid amounts are never accumulated in place. An invoice's paid total is
//! rebuilt from its submitted payment entries, and an enrollment's from its
//! non-cancelled invoices, so re-running either step yields the same values.

pub mod invoice;
pub mod mode_of_payment;
pub mod payment;
pub mod reconcile;
pub mod reminder;

pub use invoice::{FeeInvoice, InvoiceId, InvoiceStatus, IssueInvoice, UpdateInvoice};
pub use mode_of_payment::{first_enabled_mode, ModeOfPayment, ModeOfPaymentId};
pub use payment::{PaymentEntry, PaymentEntryId, PaymentState, RecordPayment};
pub use reconcile::{reconcile_enrollment, reconcile_invoice, PaymentTotals};
pub use reminder::{ReminderMessage, REMINDER_SUBJECT_MARKER};
