use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use formwatch_core::RelayError;

/// An explicit client-facing status carried through the `anyhow::Error`
/// chain, checked before any `RelayError` mapping.
#[derive(Debug)]
struct Rejection {
    status: StatusCode,
    message: String,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn reject(status: StatusCode, message: impl Into<String>) -> Self {
        Self(
            Rejection {
                status,
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::reject(StatusCode::BAD_REQUEST, msg)
    }

    /// A tick is already running.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::reject(StatusCode::CONFLICT, msg)
    }
}

fn relay_status(err: &RelayError) -> StatusCode {
    match err {
        RelayError::SourceUnavailable { .. }
        | RelayError::SourceStatus { .. }
        | RelayError::DeliveryFailed { .. }
        | RelayError::DeliveryStatus { .. }
        | RelayError::Http(_) => StatusCode::BAD_GATEWAY,
        RelayError::ConfigurationMissing(_)
        | RelayError::InvalidConfiguration(_)
        | RelayError::StateCorrupt { .. }
        | RelayError::Io(_)
        | RelayError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(r) = self.0.downcast_ref::<Rejection>() {
            let body = serde_json::json!({ "error": r.message });
            return (r.status, axum::Json(body)).into_response();
        }

        let status = self
            .0
            .downcast_ref::<RelayError>()
            .map(relay_status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = format!("{:#}", self.0);
        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        }
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
