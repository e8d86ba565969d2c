//! Outgoing mail and the communication log.
//!
//! Delivery goes through the [`Mailer`] trait. A [`Communication`] is the
//! stored record of a message that was actually sent; the reminder job looks
//! these up to avoid reminding about the same invoice twice in one day.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tutorbook_core::Record;
use tutorbook_invoicing::{InvoiceId, REMINDER_SUBJECT_MARKER};

tutorbook_core::record_id!(CommunicationId, "CommunicationId");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    pub recipients: String,
    pub sender: String,
    pub subject: String,
    pub content: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError>;
}

/// Mailer that only logs; the default for the server binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        if !mail.recipients.contains('@') {
            return Err(NotifyError::InvalidRecipient(mail.recipients.clone()));
        }
        info!(
            recipients = %mail.recipients,
            sender = %mail.sender,
            subject = %mail.subject,
            "mail sent"
        );
        Ok(())
    }
}

/// Mailer that keeps every message in memory and can be told to fail for
/// specific recipients.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.push(recipient.into());
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| NotifyError::Delivery("mailer state poisoned".to_string()))?;
        if failing.iter().any(|r| r == &mail.recipients) {
            return Err(NotifyError::Delivery(format!(
                "recipient {} rejected",
                mail.recipients
            )));
        }
        drop(failing);
        self.sent
            .lock()
            .map_err(|_| NotifyError::Delivery("mailer state poisoned".to_string()))?
            .push(mail.clone());
        Ok(())
    }
}

/// A sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    pub id: CommunicationId,
    pub reference_invoice: Option<InvoiceId>,
    pub subject: String,
    pub recipients: String,
    pub sender: String,
    pub content: String,
    pub created_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

impl Communication {
    pub fn sent(
        mail: OutgoingMail,
        reference_invoice: Option<InvoiceId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CommunicationId::generate(),
            reference_invoice,
            subject: mail.subject,
            recipients: mail.recipients,
            sender: mail.sender,
            content: mail.content,
            created_on: now.date_naive(),
            created_at: now,
            version: 0,
        }
    }

    /// A payment reminder about `invoice` recorded on `day`.
    pub fn is_reminder_for(&self, invoice: InvoiceId, day: NaiveDate) -> bool {
        self.reference_invoice == Some(invoice)
            && self.subject.contains(REMINDER_SUBJECT_MARKER)
            && self.created_on == day
    }
}

impl Record for Communication {
    type Id = CommunicationId;
    const KIND: &'static str = "communication";

    fn id(&self) -> CommunicationId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
