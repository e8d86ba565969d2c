//! Scheduled jobs.
//!
//! Jobs are registered by name on a [`JobRunner`] and triggered by an
//! external scheduler (the API binary runs a daily interval) or on demand.
//! Every trigger produces a [`JobRun`] kept in the runner's history; a job
//! that fails is recorded as failed rather than propagated.

mod payment_reminders;
pub mod types;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{error, info};

use tutorbook_core::RequestContext;

use crate::services::{ServiceError, ServiceResult};

pub use payment_reminders::PaymentReminderJob;
pub use types::{JobId, JobRun, JobStatus};

/// A unit of periodic work.
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &str;

    /// Run once, returning job-specific counters.
    fn run(&self, ctx: &RequestContext) -> ServiceResult<serde_json::Value>;
}

/// Registry of scheduled jobs and their run history.
#[derive(Default)]
pub struct JobRunner {
    jobs: BTreeMap<String, Arc<dyn ScheduledJob>>,
    history: Mutex<Vec<JobRun>>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, job: Arc<dyn ScheduledJob>) -> Self {
        self.jobs.insert(job.name().to_string(), job);
        self
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.keys().map(String::as_str).collect()
    }

    /// Run the named job as the system actor at `now`.
    pub fn trigger(&self, name: &str, now: DateTime<Utc>) -> ServiceResult<JobRun> {
        let job = self
            .jobs
            .get(name)
            .ok_or_else(|| ServiceError::not_found("job"))?;
        let ctx = RequestContext::system(now);
        let started_at = Utc::now();
        let (status, summary) = match job.run(&ctx) {
            Ok(summary) => {
                info!(request_id = %ctx.request_id(), job = name, "job completed");
                (JobStatus::Completed, summary)
            }
            Err(e) => {
                error!(request_id = %ctx.request_id(), job = name, error = %e, "job failed");
                (
                    JobStatus::Failed {
                        error: e.to_string(),
                    },
                    serde_json::Value::Null,
                )
            }
        };
        let run = JobRun {
            id: JobId::new(),
            job: name.to_string(),
            status,
            started_at,
            finished_at: Utc::now(),
            summary,
        };
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(run.clone());
        Ok(run)
    }

    /// Past runs, oldest first.
    pub fn history(&self) -> Vec<JobRun> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for JobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("jobs", &self.job_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorbook_core::DomainError;

    struct Fixed(Result<u32, &'static str>);

    impl ScheduledJob for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn run(&self, _ctx: &RequestContext) -> ServiceResult<serde_json::Value> {
            match self.0 {
                Ok(n) => Ok(serde_json::json!({ "processed": n })),
                Err(msg) => Err(DomainError::conflict(msg).into()),
            }
        }
    }

    #[test]
    fn trigger_records_successful_run() {
        let runner = JobRunner::new().register(Arc::new(Fixed(Ok(3))));
        let run = runner.trigger("fixed", Utc::now()).unwrap();
        assert!(run.status.is_success());
        assert_eq!(run.summary["processed"], 3);
        assert_eq!(runner.history().len(), 1);
    }

    #[test]
    fn failed_run_is_recorded_not_propagated() {
        let runner = JobRunner::new().register(Arc::new(Fixed(Err("boom"))));
        let run = runner.trigger("fixed", Utc::now()).unwrap();
        assert_eq!(
            run.status,
            JobStatus::Failed {
                error: "conflict: boom".to_string()
            }
        );
        assert!(run.summary.is_null());
    }

    #[test]
    fn unknown_job_is_not_found() {
        let runner = JobRunner::new();
        let err = runner.trigger("nope", Utc::now()).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
