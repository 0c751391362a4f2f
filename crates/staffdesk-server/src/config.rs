use std::env;

use anyhow::{Context, Result};
use url::Url;

use staffdesk_discord::gateway::DEFAULT_GATEWAY_URL;
use staffdesk_discord::rest::DEFAULT_API_BASE;
use staffdesk_types::discord::Snowflake;

const DEFAULT_STAFF_ROLES: &str = "Commissioner,Co-Commissioner";

#[derive(Clone)]
pub struct Config {
    pub bot_token: String,
    pub directory_channel: Snowflake,
    pub sheet_webhook_url: String,
    /// Role names allowed to approve or deny, matched case-insensitively.
    pub staff_roles: Vec<String>,
    pub host: String,
    pub port: u16,
    pub api_base: Url,
    pub gateway_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = get("BOT_TOKEN")
            .filter(|s| !s.trim().is_empty())
            .context("BOT_TOKEN environment variable is required")?;

        let directory_channel = get("DIRECTORY_CHANNEL_ID")
            .context("DIRECTORY_CHANNEL_ID environment variable is required")?
            .parse::<Snowflake>()
            .context("DIRECTORY_CHANNEL_ID must be a Discord channel id")?;

        let sheet_webhook_url = get("SHEET_WEBHOOK_URL")
            .filter(|s| !s.trim().is_empty())
            .context("SHEET_WEBHOOK_URL environment variable is required")?;
        Url::parse(&sheet_webhook_url).context("SHEET_WEBHOOK_URL must be a valid URL")?;

        let staff_roles = get("STAFF_ROLES")
            .unwrap_or_else(|| DEFAULT_STAFF_ROLES.to_string())
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>();
        if staff_roles.is_empty() {
            anyhow::bail!("STAFF_ROLES must name at least one role");
        }

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = get("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        let api_base = get("DISCORD_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = Url::parse(&api_base).context("DISCORD_API_BASE must be a valid URL")?;

        let gateway_url =
            get("DISCORD_GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

        Ok(Config {
            bot_token,
            directory_channel,
            sheet_webhook_url,
            staff_roles,
            host,
            port,
            api_base,
            gateway_url,
        })
    }
}
