//! Maps [`SupervisorError`] onto the wire error shape and HTTP status codes
//! documented for the control plane.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taskwarden_core::SupervisorError;

/// `{"detail": <message>, "status_code": <code>}`, every non-2xx body.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
    status_code: u16,
}

/// Newtype so this crate can implement `IntoResponse` for a foreign error
/// type.
pub struct ApiError(pub SupervisorError);

impl From<SupervisorError> for ApiError {
    fn from(err: SupervisorError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // `JobNotFound`/`JobAlreadyRunning`/`JobNotRunning` use the fixed
        // detail strings of the original interface, not `Display`, to stay
        // bit-compatible with it.
        let (status, detail) = match &self.0 {
            SupervisorError::JobNotFound(_) => (StatusCode::NOT_FOUND, "Job not found".to_string()),
            SupervisorError::JobAlreadyRunning(_) => (
                StatusCode::from_u16(402).expect("402 is a valid status code"),
                "Job already running".to_string(),
            ),
            SupervisorError::JobNotRunning(_) => (
                StatusCode::from_u16(402).expect("402 is a valid status code"),
                "Job not running".to_string(),
            ),
            SupervisorError::JobAlreadyExists(_) | SupervisorError::InvalidCronExpression { .. } => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
        };

        let body = ErrorBody {
            detail,
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}
