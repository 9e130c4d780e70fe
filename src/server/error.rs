//! HTTP mapping for capture errors

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::errors::CaptureError;

/// A `CaptureError` on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub CaptureError);

impl From<CaptureError> for ApiError {
    fn from(error: CaptureError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(CaptureError::MalformedInput(message.into()))
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CaptureError::InvalidUrl { .. } | CaptureError::MalformedInput(_) => {
                StatusCode::BAD_REQUEST
            }
            CaptureError::NotFound(_) => StatusCode::NOT_FOUND,
            CaptureError::SeedTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CaptureError::Upstream { .. } | CaptureError::Network { .. } => StatusCode::BAD_GATEWAY,
            CaptureError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self.0, "request failed");
        } else {
            tracing::debug!(%status, error = %self.0, "request rejected");
        }

        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}
