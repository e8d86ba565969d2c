use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use tutorbook_catalog::{BatchId, ScheduleBatch, UpdateBatch};
use tutorbook_core::RequestContext;
use tutorbook_infra::Services;

use crate::app::dto::{self, created, parse_id, success};
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/", post(schedule_batch))
        .route("/:id", get(get_batch).put(update_batch))
        .route("/:id/enrollments", get(batch_enrollments))
        .route("/:id/attendance-summary", get(batch_attendance_summary))
        .route("/:id/available-slots", get(available_slots))
        .route("/:id/is-full", get(is_full))
        .route("/:id/attendance", post(mark_roster))
}

pub async fn schedule_batch(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<ScheduleBatch>,
) -> ApiResult<impl IntoResponse> {
    created(&services.schedule_batch(&ctx, body)?)
}

pub async fn get_batch(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.get_batch(parse_id::<BatchId>(&id)?)?)
}

pub async fn update_batch(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBatch>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_batch(&ctx, parse_id(&id)?, body)?)
}

pub async fn batch_enrollments(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.batch_enrollments(parse_id(&id)?)?)
}

pub async fn batch_attendance_summary(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.batch_attendance_summary(parse_id(&id)?)?)
}

/// `null` when the batch has no capacity limit.
pub async fn available_slots(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let slots = services.available_slots(parse_id(&id)?)?;
    success(&json!({ "available_slots": slots }))
}

pub async fn is_full(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let full = services.is_batch_full(parse_id(&id)?)?;
    success(&json!({ "is_full": full }))
}

pub async fn mark_roster(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::MarkRosterRequest>,
) -> ApiResult<impl IntoResponse> {
    let result =
        services.mark_batch_attendance(&ctx, parse_id(&id)?, body.attendance_date, body.students)?;
    success(&result)
}
