use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use staffdesk_discord::PlatformError;
use staffdesk_types::api::{
    APPROVE_EMOJI, DENY_EMOJI, ErrorResponse, SendEmbedRequest, SendEmbedResponse,
};

use crate::AppState;
use crate::embed::build_embed;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Bot not ready")]
    NotReady,

    #[error("{0}")]
    Failed(String),
}

impl From<PlatformError> for SubmissionError {
    fn from(e: PlatformError) -> Self {
        Self::Failed(e.to_string())
    }
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// POST /sendEmbed: publish one application to the directory channel with
/// the approve/deny reactions attached.
///
/// Nothing is rolled back if a reaction fails after the message was sent.
pub async fn send_embed(
    State(state): State<AppState>,
    payload: Result<Json<SendEmbedRequest>, JsonRejection>,
) -> Result<Json<SendEmbedResponse>, SubmissionError> {
    if !state.session.is_ready() {
        return Err(SubmissionError::NotReady);
    }

    publish(&state, payload)
        .await
        .inspect_err(|e| error!("/sendEmbed error: {}", e))?;

    Ok(Json(SendEmbedResponse { success: true }))
}

async fn publish(
    state: &AppState,
    payload: Result<Json<SendEmbedRequest>, JsonRejection>,
) -> Result<(), SubmissionError> {
    let Json(req) = payload.map_err(|e| SubmissionError::Failed(e.body_text()))?;

    let embed = build_embed(&req, chrono::Utc::now());
    let message = state
        .platform
        .send_embed(state.directory_channel, &embed)
        .await?;

    for emoji in [APPROVE_EMOJI, DENY_EMOJI] {
        state
            .platform
            .add_reaction(message.channel_id, message.id, emoji)
            .await?;
    }

    info!("Posted '{}' to directory as message {}", req.title, message.id);
    Ok(())
}
