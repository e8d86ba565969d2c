use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use tutorbook_catalog::{CourseId, CreateCourse, UpdateCourse};
use tutorbook_core::RequestContext;
use tutorbook_infra::Services;

use crate::app::dto::{created, parse_id, success};
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_course))
        .route("/:id", get(get_course).put(update_course))
        .route("/:id/enrollments", get(course_enrollments))
        .route("/:id/total-enrollments", get(course_total_enrollments))
        .route("/:id/revenue", get(course_revenue))
}

pub async fn create_course(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<CreateCourse>,
) -> ApiResult<impl IntoResponse> {
    created(&services.create_course(&ctx, body)?)
}

pub async fn get_course(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.get_course(parse_id::<CourseId>(&id)?)?)
}

pub async fn update_course(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCourse>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_course(&ctx, parse_id(&id)?, body)?)
}

pub async fn course_enrollments(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.course_enrollments(parse_id(&id)?)?)
}

pub async fn course_total_enrollments(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let total = services.course_total_enrollments(parse_id(&id)?)?;
    success(&json!({ "total_enrollments": total }))
}

pub async fn course_revenue(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let revenue = services.course_revenue(parse_id(&id)?)?;
    success(&json!({ "revenue": revenue }))
}
