use serde::{Deserialize, Serialize};

/// Reaction that approves an application.
pub const APPROVE_EMOJI: &str = "✅";
/// Reaction that denies an application.
pub const DENY_EMOJI: &str = "❌";

/// Placeholder for a field submitted without a value.
pub const NOT_AVAILABLE: &str = "N/A";

// -- Submissions --

/// Body of `POST /sendEmbed`, sent by the spreadsheet script for each new
/// application row.
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmbedRequest {
    pub title: String,
    #[serde(default)]
    pub color: Option<u32>,
    pub fields: Vec<FieldInput>,
    #[serde(default)]
    pub footer: Option<FooterInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldInput {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub inline: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FooterInput {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendEmbedResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Health --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ready: bool,
}

// -- Write-back --

/// Payload posted to the spreadsheet webhook once a decision is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub row_index: u64,
    pub status: String,
}
