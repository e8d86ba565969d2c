use axum::{middleware::Next, response::Response};
use chrono::Utc;
use tracing::debug;

use tutorbook_core::RequestContext;

use crate::context::actor_from_headers;

/// Attach a [`RequestContext`] (caller and request time) to every request.
pub async fn request_context_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ctx = RequestContext::new(actor_from_headers(req.headers()), Utc::now());
    debug!(
        request_id = %ctx.request_id(),
        actor = ctx.actor(),
        method = %req.method(),
        path = %req.uri().path(),
        "request"
    );
    req.extensions_mut().insert(ctx);
    next.run(req).await
}
