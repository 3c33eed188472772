use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

#[derive(Clone)]
pub struct HealthState {
    documents: usize,
}

/// Probe routes for deployment infrastructure. They share the process
/// with the bot but none of its state beyond the document count captured
/// at startup.
pub fn health_routes(documents: usize) -> Router {
    Router::new()
        .route("/live", get(live))
        .route("/ready", get(ready))
        .with_state(HealthState { documents })
}

/// Liveness probe: always returns 200 to indicate the process is running.
async fn live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Readiness probe: 200 with the configured document count.
async fn ready(State(state): State<HealthState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "checks": { "documents": state.documents }
        })),
    )
}
