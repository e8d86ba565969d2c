//! Application services.
//!
//! [`Services`] implements every operation of the application on top of a
//! [`Store`]. Domain crates decide; this layer loads the records a decision
//! needs, persists the outcome with optimistic version checks and runs the
//! follow-up cascade:
//!
//! ```text
//! payment entry -> fee invoice -> student enrollment -> batch seat count
//! ```
//!
//! Each step rebuilds its totals from the records below it, so re-running any
//! part of the chain is harmless.

mod attendance;
mod catalog;
mod enrollment;
mod error;
mod invoicing;
mod reminders;
mod students;

use std::sync::{Arc, Mutex};

use tutorbook_catalog::BatchId;
use tutorbook_core::Record;
use tutorbook_invoicing::InvoiceId;

use crate::locks::KeyedLocks;
use crate::notify::Mailer;
use crate::store::{Repository, Store};

pub use error::{ServiceError, ServiceResult};
pub use invoicing::{EnrollmentPaymentStatus, InvoicePaymentStatus, PaymentReceipt};
pub use reminders::{ReminderRun, SEND_PAYMENT_REMINDERS};

pub struct Services {
    store: Store,
    mailer: Arc<dyn Mailer>,
    batch_locks: KeyedLocks<BatchId>,
    invoice_locks: KeyedLocks<InvoiceId>,
    code_lock: Mutex<()>,
    reminder_sender: String,
}

impl Services {
    pub fn new(store: Store, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            mailer,
            batch_locks: KeyedLocks::new(),
            invoice_locks: KeyedLocks::new(),
            code_lock: Mutex::new(()),
            reminder_sender: "Administrator".to_string(),
        }
    }

    /// Sender recorded on reminders sent by the scheduled job.
    pub fn with_reminder_sender(mut self, sender: impl Into<String>) -> Self {
        self.reminder_sender = sender.into();
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl core::fmt::Debug for Services {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Services")
            .field("reminder_sender", &self.reminder_sender)
            .finish_non_exhaustive()
    }
}

/// Load a record or fail with `NotFound(<kind>)`.
fn require<R: Record>(repo: &dyn Repository<R>, id: R::Id) -> ServiceResult<R> {
    repo.get(id)?.ok_or_else(|| ServiceError::not_found(R::KIND))
}
