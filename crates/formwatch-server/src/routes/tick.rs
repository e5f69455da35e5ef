use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use formwatch_core::descriptor::TickRequest;

use crate::error::AppError;
use crate::state::AppState;
use crate::ticker;

/// POST /tick: start one tick in the background and answer immediately.
///
/// The body is optional; when present it may override the delivery target
/// (`return_url`) and the sheet locator (`google sheets` setting) for this
/// tick. A trigger that arrives while another tick runs gets 409.
pub async fn trigger_tick(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let request = parse_request(&body)?;
    let targets = request.resolve(&app.config);
    tracing::info!(webhook = %targets.target, "tick requested");

    if ticker::try_start_tick(&app, targets).is_none() {
        tracing::info!("tick already in progress; dropping trigger");
        return Err(AppError::conflict("tick already in progress"));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "accepted" })),
    ))
}

fn parse_request(body: &[u8]) -> Result<TickRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TickRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::bad_request(format!("invalid payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_default_request() {
        let request = parse_request(b"").unwrap();
        assert!(request.return_url.is_none());
        assert!(request.settings.is_empty());

        assert!(parse_request(b"  \n").is_ok());
    }

    #[test]
    fn malformed_body_is_bad_request() {
        use axum::response::IntoResponse;
        let err = parse_request(b"{oops").unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn body_with_return_url_parses() {
        let request = parse_request(br#"{"return_url":"http://hook","settings":[]}"#).unwrap();
        assert_eq!(request.return_url.as_deref(), Some("http://hook"));
    }
}
