use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;

use tutorbook_infra::jobs::JobRunner;

use crate::app::dto::success;
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/", get(job_history))
        .route("/:name/run", post(run_job))
}

/// Trigger a registered job now; failures are reported in the returned run.
pub async fn run_job(
    Extension(jobs): Extension<Arc<JobRunner>>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let run = tokio::task::spawn_blocking(move || jobs.trigger(&name, Utc::now()))
        .await
        .map_err(|e| tutorbook_core::DomainError::invariant(format!("job task aborted: {e}")))??;
    success(&run)
}

pub async fn job_history(
    Extension(jobs): Extension<Arc<JobRunner>>,
) -> ApiResult<impl IntoResponse> {
    success(&jobs.history())
}
