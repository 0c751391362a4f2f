pub mod embed;
pub mod health;
pub mod submission;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use staffdesk_discord::{ChatPlatform, SessionState};
use staffdesk_types::discord::Snowflake;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub platform: Arc<dyn ChatPlatform>,
    pub session: SessionState,
    /// Staff channel every application is posted to.
    pub directory_channel: Snowflake,
}

/// Routes served to the spreadsheet script.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sendEmbed", post(submission::send_embed))
        .route("/health", get(health::health))
        .with_state(state)
}
