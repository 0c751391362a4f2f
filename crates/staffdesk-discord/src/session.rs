use std::sync::{Arc, OnceLock};

use staffdesk_types::discord::Snowflake;

/// Who the bot is logged in as, captured from the READY dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user_id: Snowflake,
    pub tag: String,
    pub session_id: String,
}

/// Readiness of the gateway session.
///
/// Unset at startup, set once by the first READY, never reset. Reconnects
/// after that keep reporting ready.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    identity: Arc<OnceLock<BotIdentity>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the handshake. Returns false if the session was already ready.
    pub fn mark_ready(&self, identity: BotIdentity) -> bool {
        self.identity.set(identity).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.identity.get().is_some()
    }

    pub fn identity(&self) -> Option<&BotIdentity> {
        self.identity.get()
    }
}
