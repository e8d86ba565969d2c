//! Request context passed explicitly into every operation.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Identity and clock of the caller for a single operation.
///
/// Carries the acting user (recorded as sender on communications and in
/// logs) and the instant the request is evaluated at. "Today" for overdue
/// checks, default payment dates and future-date validation is derived from
/// `now`, never from the system clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    actor: String,
    now: DateTime<Utc>,
    request_id: Uuid,
}

impl RequestContext {
    pub fn new(actor: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            actor: actor.into(),
            now,
            request_id: Uuid::now_v7(),
        }
    }

    /// Context for scheduled jobs and other system-initiated work.
    pub fn system(now: DateTime<Utc>) -> Self {
        Self::new("Administrator", now)
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}
