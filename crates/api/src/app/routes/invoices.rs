use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use tutorbook_core::RequestContext;
use tutorbook_infra::Services;
use tutorbook_invoicing::{InvoiceId, IssueInvoice, RecordPayment, UpdateInvoice};

use crate::app::dto::{created, parse_id, success};
use crate::app::errors::ApiResult;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_invoice))
        .route("/:id", get(get_invoice).put(update_invoice))
        .route("/:id/payments", post(create_payment_entry))
        .route("/:id/payment-status", post(refresh_payment_status))
        .route("/:id/payment-history", get(payment_history))
        .route("/:id/reminder", post(send_reminder))
        .route("/:id/mark-paid", post(mark_as_paid))
        .route("/:id/cancel", post(cancel_invoice))
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<IssueInvoice>,
) -> ApiResult<impl IntoResponse> {
    created(&services.create_invoice(&ctx, body)?)
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.get_invoice(parse_id::<InvoiceId>(&id)?)?)
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateInvoice>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_invoice(&ctx, parse_id(&id)?, body)?)
}

/// Record and submit a payment, then run the cascade.
pub async fn create_payment_entry(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<RecordPayment>,
) -> ApiResult<impl IntoResponse> {
    created(&services.apply_payment(&ctx, parse_id(&id)?, body)?)
}

pub async fn refresh_payment_status(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.update_invoice_payment_status(&ctx, parse_id(&id)?)?)
}

pub async fn payment_history(
    Extension(services): Extension<Arc<Services>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.invoice_payment_history(parse_id(&id)?)?)
}

pub async fn send_reminder(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.send_reminder(&ctx, parse_id(&id)?)?)
}

pub async fn mark_as_paid(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.mark_as_paid(&ctx, parse_id(&id)?)?)
}

pub async fn cancel_invoice(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    success(&services.cancel_invoice(&ctx, parse_id(&id)?)?)
}
