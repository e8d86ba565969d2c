use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
    Router,
};

use tutorbook_infra::reports::{AttendanceReportFilter, PaymentReportFilter};
use tutorbook_infra::Services;

use crate::app::dto::success;
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/attendance", get(attendance_report))
        .route("/payments", get(payment_report))
}

pub async fn attendance_report(
    Extension(services): Extension<Arc<Services>>,
    Query(filter): Query<AttendanceReportFilter>,
) -> ApiResult<impl IntoResponse> {
    success(&services.attendance_report(&filter)?)
}

pub async fn payment_report(
    Extension(services): Extension<Arc<Services>>,
    Query(filter): Query<PaymentReportFilter>,
) -> ApiResult<impl IntoResponse> {
    success(&services.payment_report(&filter)?)
}
