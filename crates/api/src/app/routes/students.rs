use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use tutorbook_core::RequestContext;
use tutorbook_infra::Services;
use tutorbook_students::{RegisterStudent, StudentId, UpdateStudent};

use crate::app::dto::{created, parse_id, success};
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_student))
        .route("/:id", get(get_student).put(update_student))
        .route("/:id/enrollments", get(student_enrollments))
}

pub async fn register_student(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<RegisterStudent>,
) -> ApiResult<impl IntoResponse> {
    created(&services.register_student(&ctx, body)?)
}

pub async fn get_student(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.get_student(parse_id::<StudentId>(&id)?)?)
}

pub async fn update_student(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStudent>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_student(&ctx, parse_id(&id)?, body)?)
}

pub async fn student_enrollments(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.student_enrollments(parse_id(&id)?)?)
}
