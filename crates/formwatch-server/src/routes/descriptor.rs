use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use formwatch_core::descriptor::{DescriptorEnvelope, IntegrationDescriptor};

use crate::state::AppState;

/// GET|POST /integration.json: static self-description for the
/// registering orchestrator.
pub async fn get_descriptor(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> Json<DescriptorEnvelope> {
    let base_url = app
        .public_url
        .clone()
        .unwrap_or_else(|| base_url_from_headers(&headers));
    Json(IntegrationDescriptor::for_config(&app.config, &base_url).into_envelope())
}

/// `{proto}://{host}` from `X-Forwarded-Proto` (default `http`) and `Host`.
fn base_url_from_headers(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}
