//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use irhub_domain::error::{CaptureError, IrHubError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`IrHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(IrHubError);

impl<E: Into<IrHubError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

fn describe(err: &IrHubError) -> String {
    match err {
        IrHubError::Validation(inner) => inner.to_string(),
        IrHubError::CaptureFailed(inner) => format!("capture failed: {inner}"),
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IrHubError::Validation(_) => StatusCode::BAD_REQUEST,
            IrHubError::NotFound(_) => StatusCode::NOT_FOUND,
            IrHubError::Duplicate(_) => StatusCode::CONFLICT,
            IrHubError::CaptureFailed(CaptureError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            IrHubError::CaptureFailed(_) => StatusCode::BAD_GATEWAY,
            IrHubError::Blaster(err) => {
                tracing::error!(error = %err, "blaster error");
                StatusCode::BAD_GATEWAY
            }
            IrHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "internal server error".to_string(),
                    }),
                )
                    .into_response();
            }
        };

        (
            status,
            Json(ErrorBody {
                error: describe(&self.0),
            }),
        )
            .into_response()
    }
}
