use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use tutorbook_core::RequestContext;
use tutorbook_infra::reports::PaymentSummaryFilter;
use tutorbook_infra::Services;

use crate::app::dto::{self, created, success};
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new().route("/summary", get(payment_summary))
}

pub async fn payment_summary(
    Extension(services): Extension<Arc<Services>>,
    Query(filter): Query<PaymentSummaryFilter>,
) -> ApiResult<impl IntoResponse> {
    success(&services.payment_summary(&filter)?)
}

pub async fn create_mode_of_payment(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateModeOfPaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    created(&services.create_mode_of_payment(&ctx, &body.mode_of_payment, body.enabled)?)
}
