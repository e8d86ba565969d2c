use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use tutorbook_attendance::{AttendanceId, MarkAttendance, UpdateAttendance};
use tutorbook_core::RequestContext;
use tutorbook_infra::Services;

use crate::app::dto::{self, created, parse_id, success};
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/", post(mark_attendance))
        .route("/summary", get(attendance_summary))
        .route("/:id", get(get_attendance).put(update_attendance))
}

pub async fn mark_attendance(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<MarkAttendance>,
) -> ApiResult<impl IntoResponse> {
    created(&services.mark_attendance(&ctx, body)?)
}

pub async fn get_attendance(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.get_attendance(parse_id::<AttendanceId>(&id)?)?)
}

pub async fn update_attendance(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAttendance>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_attendance(&ctx, parse_id(&id)?, body)?)
}

pub async fn attendance_summary(
    Extension(services): Extension<Arc<Services>>,
    Query(query): Query<dto::AttendanceSummaryQuery>,
) -> ApiResult<impl IntoResponse> {
    success(&services.attendance_summary(query.student, query.batch)?)
}
