use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/status: whether a tick is running, how many identifiers are
/// tracked, and the outcome of the last completed tick.
pub async fn get_status(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let relay = app.relay.clone();
    let tracked = tokio::task::spawn_blocking(move || relay.tracked())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??
        .map(|set| set.len())
        .unwrap_or(0);

    Ok(Json(serde_json::json!({
        "tick_running": app.tick_running(),
        "tracked": tracked,
        "last_tick": app.last_tick(),
    })))
}
