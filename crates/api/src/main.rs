use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use tutorbook_api::app::{build_app, services};
use tutorbook_api::config::ApiConfig;
use tutorbook_infra::jobs::JobRunner;
use tutorbook_infra::services::SEND_PAYMENT_REMINDERS;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tutorbook_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = services::build_services(&config);
    let jobs = services::build_jobs(services.clone());

    match config.reminder_interval {
        Some(period) => {
            tokio::spawn(run_reminders_every(jobs.clone(), period));
        }
        None => tracing::info!("built-in reminder schedule disabled"),
    }

    let app = build_app(services, jobs);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Trigger the payment reminder job once per `period`, the first time after
/// one full period.
async fn run_reminders_every(jobs: Arc<JobRunner>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let jobs = jobs.clone();
        let outcome =
            tokio::task::spawn_blocking(move || jobs.trigger(SEND_PAYMENT_REMINDERS, Utc::now()))
                .await;
        match outcome {
            Ok(Ok(run)) => tracing::info!(
                run = %run.id,
                success = run.status.is_success(),
                "scheduled reminders ran"
            ),
            Ok(Err(e)) => tracing::error!(error = %e, "scheduled reminders could not start"),
            Err(e) => tracing::error!(error = %e, "scheduled reminders task aborted"),
        }
    }
}
