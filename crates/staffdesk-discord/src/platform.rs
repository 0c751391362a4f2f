use async_trait::async_trait;

use staffdesk_types::discord::{Embed, Guild, Member, Message, Snowflake};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("discord returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request url: {0}")]
    Url(String),

    #[error("{0}")]
    Other(String),
}

/// Operations the bot performs against the chat platform.
///
/// Every call is a single request with no retry; callers decide whether a
/// failure is fatal to their flow.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn fetch_message(&self, channel: Snowflake, message: Snowflake) -> Result<Message, PlatformError>;

    async fn send_embed(&self, channel: Snowflake, embed: &Embed) -> Result<Message, PlatformError>;

    /// React as the bot.
    async fn add_reaction(&self, channel: Snowflake, message: Snowflake, emoji: &str) -> Result<(), PlatformError>;

    /// Remove `user`'s reaction, undoing their click.
    async fn remove_user_reaction(
        &self,
        channel: Snowflake,
        message: Snowflake,
        emoji: &str,
        user: Snowflake,
    ) -> Result<(), PlatformError>;

    /// Reply to a message without pinging anyone.
    async fn reply(&self, channel: Snowflake, message: Snowflake, content: &str) -> Result<(), PlatformError>;

    async fn fetch_member(&self, guild: Snowflake, user: Snowflake) -> Result<Member, PlatformError>;

    async fn fetch_guild(&self, guild: Snowflake) -> Result<Guild, PlatformError>;

    /// Members whose username or nickname starts with `query`.
    async fn search_members(&self, guild: Snowflake, query: &str) -> Result<Vec<Member>, PlatformError>;

    async fn send_direct_message(&self, user: Snowflake, content: &str) -> Result<(), PlatformError>;
}
