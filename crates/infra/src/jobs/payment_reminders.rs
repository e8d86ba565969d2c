use std::sync::Arc;

use tutorbook_core::{DomainError, RequestContext};

use crate::services::{ServiceResult, Services, SEND_PAYMENT_REMINDERS};

use super::ScheduledJob;

/// Daily overdue-invoice reminder run.
#[derive(Debug, Clone)]
pub struct PaymentReminderJob {
    services: Arc<Services>,
}

impl PaymentReminderJob {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl ScheduledJob for PaymentReminderJob {
    fn name(&self) -> &str {
        SEND_PAYMENT_REMINDERS
    }

    fn run(&self, ctx: &RequestContext) -> ServiceResult<serde_json::Value> {
        let run = self.services.send_payment_reminders(ctx)?;
        Ok(serde_json::to_value(run).map_err(|e| DomainError::invariant(e.to_string()))?)
    }
}
