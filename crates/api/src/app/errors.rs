use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use tutorbook_core::DomainError;
use tutorbook_infra::ServiceError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a request, rendered as the JSON error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("response encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Service(err.into())
    }
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Service(e) => e.kind(),
            ApiError::Encode(_) => "encode_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            "validation" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "request failed");
        }
        json_error(status, self.kind(), self.to_string())
    }
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "status": "error",
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
