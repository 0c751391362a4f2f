use axum::{Json, extract::State};

use staffdesk_types::api::HealthResponse;

use crate::AppState;

/// GET /health: whether the gateway session has completed its handshake.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ready: state.session.is_ready(),
    })
}
