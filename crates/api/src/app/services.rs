use std::sync::Arc;

use tutorbook_infra::jobs::{JobRunner, PaymentReminderJob};
use tutorbook_infra::notify::{LogMailer, Mailer};
use tutorbook_infra::{Services, Store};

use crate::config::ApiConfig;

/// In-memory services with the logging mailer.
pub fn build_services(config: &ApiConfig) -> Arc<Services> {
    build_services_with_mailer(config, Arc::new(LogMailer))
}

pub fn build_services_with_mailer(config: &ApiConfig, mailer: Arc<dyn Mailer>) -> Arc<Services> {
    Arc::new(
        Services::new(Store::in_memory(), mailer)
            .with_reminder_sender(config.reminder_sender.clone()),
    )
}

/// Runner with every scheduled job registered.
pub fn build_jobs(services: Arc<Services>) -> Arc<JobRunner> {
    Arc::new(JobRunner::new().register(Arc::new(PaymentReminderJob::new(services))))
}
