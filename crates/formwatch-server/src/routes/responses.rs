use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/responses: the current fetched list, without touching the
/// tracked set. A failed fetch yields an empty list.
pub async fn list_responses(State(app): State<AppState>) -> Json<serde_json::Value> {
    let rows = app.relay.responses(&app.config.source_url).await;
    Json(serde_json::json!({ "data": rows }))
}
