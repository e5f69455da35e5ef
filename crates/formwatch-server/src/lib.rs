pub mod error;
pub mod routes;
pub mod state;
pub mod ticker;

use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index::index))
        // Descriptor
        .route(
            "/integration.json",
            get(routes::descriptor::get_descriptor).post(routes::descriptor::get_descriptor),
        )
        // Trigger
        .route("/tick", post(routes::tick::trigger_tick))
        // Read
        .route("/api/responses", get(routes::responses::list_responses))
        .route("/api/status", get(routes::status::get_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve on a pre-bound listener until the future completes or fails.
///
/// When `poll_every` is set, an in-process timer triggers a tick on that
/// period alongside externally triggered ticks; both share one tick guard.
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    poll_every: Option<Duration>,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();

    let poller = poll_every.map(|every| {
        tracing::info!(every_secs = every.as_secs(), "in-process polling enabled");
        ticker::spawn_poller(app_state.clone(), every)
    });

    let app = build_router(app_state);
    tracing::info!("formwatch listening on http://localhost:{actual_port}");

    let result = axum::serve(listener, app).await;
    if let Some(handle) = poller {
        handle.abort();
    }
    result?;
    Ok(())
}
