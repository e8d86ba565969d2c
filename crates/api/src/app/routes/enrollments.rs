use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use tutorbook_core::RequestContext;
use tutorbook_enrollment::{EnrollStudent, EnrollmentId, UpdateEnrollment};
use tutorbook_infra::Services;

use crate::app::dto::{created, parse_id, success};
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/", post(enroll))
        .route("/:id", get(get_enrollment).put(update_enrollment))
        .route("/:id/invoices", get(enrollment_invoices))
        .route("/:id/payment-history", get(payment_history))
        .route("/:id/attendance-summary", get(attendance_summary))
        .route("/:id/payment-status", post(refresh_payment_status))
}

pub async fn enroll(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<EnrollStudent>,
) -> ApiResult<impl IntoResponse> {
    created(&services.enroll(&ctx, body)?)
}

pub async fn get_enrollment(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.get_enrollment(parse_id::<EnrollmentId>(&id)?)?)
}

pub async fn update_enrollment(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEnrollment>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_enrollment(&ctx, parse_id(&id)?, body)?)
}

pub async fn enrollment_invoices(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.enrollment_invoices(parse_id(&id)?)?)
}

pub async fn payment_history(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.enrollment_payment_history(parse_id(&id)?)?)
}

pub async fn attendance_summary(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.enrollment_attendance_summary(parse_id(&id)?)?)
}

/// Rebuild the enrollment's totals from its invoices.
pub async fn refresh_payment_status(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_enrollment_payment_status(&ctx, parse_id(&id)?)?)
}
