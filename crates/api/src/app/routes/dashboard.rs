use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
    Router,
};

use tutorbook_core::RequestContext;
use tutorbook_infra::Services;

use crate::app::dto::{self, success};
use crate::app::errors::ApiResult;

const DEFAULT_REVENUE_MONTHS: u32 = 6;

pub fn router() -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/revenue", get(revenue_chart))
        .route("/course-popularity", get(course_popularity))
}

pub async fn dashboard(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<impl IntoResponse> {
    success(&services.dashboard(&ctx)?)
}

pub async fn revenue_chart(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<dto::RevenueQuery>,
) -> ApiResult<impl IntoResponse> {
    let months = query.months.unwrap_or(DEFAULT_REVENUE_MONTHS);
    success(&services.revenue_chart(&ctx, months)?)
}

pub async fn course_popularity(
    Extension(services): Extension<Arc<Services>>,
) -> ApiResult<impl IntoResponse> {
    success(&services.course_popularity()?)
}
