use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use staffdesk_types::discord::{
    AllowedMentions, CreateDm, CreateMessage, DmChannel, Embed, Guild, Member, Message,
    MessageReference, Snowflake,
};

use crate::platform::{ChatPlatform, PlatformError};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Upper bound on members returned by a username search.
const MEMBER_SEARCH_LIMIT: u32 = 100;

/// Discord REST client authenticated as the bot.
#[derive(Clone)]
pub struct DiscordHttp {
    client: reqwest::Client,
    base: Url,
    token: String,
}

impl DiscordHttp {
    pub fn new(token: impl Into<String>, base: Url) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                "DiscordBot (https://github.com/staffdesk/staffdesk, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            client,
            base,
            token: token.into(),
        })
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment (emoji
    /// included).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PlatformError> {
        endpoint(&self.base, segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url.path());
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bot {}", self.token))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, PlatformError> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        Err(PlatformError::Status {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, PlatformError> {
        Ok(self.send(req).await?.json::<T>().await?)
    }

    async fn create_message(&self, channel: Snowflake, body: &CreateMessage) -> Result<Message, PlatformError> {
        let channel = channel.to_string();
        let url = self.endpoint(&["channels", &channel, "messages"])?;
        self.send_json(self.request(Method::POST, url).json(body)).await
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, PlatformError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| PlatformError::Url(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl ChatPlatform for DiscordHttp {
    async fn fetch_message(&self, channel: Snowflake, message: Snowflake) -> Result<Message, PlatformError> {
        let (channel, message) = (channel.to_string(), message.to_string());
        let url = self.endpoint(&["channels", &channel, "messages", &message])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn send_embed(&self, channel: Snowflake, embed: &Embed) -> Result<Message, PlatformError> {
        let body = CreateMessage {
            content: None,
            embeds: vec![embed.clone()],
            message_reference: None,
            allowed_mentions: None,
        };
        self.create_message(channel, &body).await
    }

    async fn add_reaction(&self, channel: Snowflake, message: Snowflake, emoji: &str) -> Result<(), PlatformError> {
        let (channel, message) = (channel.to_string(), message.to_string());
        let url = self.endpoint(&["channels", &channel, "messages", &message, "reactions", emoji, "@me"])?;
        self.send(self.request(Method::PUT, url)).await?;
        Ok(())
    }

    async fn remove_user_reaction(
        &self,
        channel: Snowflake,
        message: Snowflake,
        emoji: &str,
        user: Snowflake,
    ) -> Result<(), PlatformError> {
        let (channel, message, user) = (channel.to_string(), message.to_string(), user.to_string());
        let url = self.endpoint(&["channels", &channel, "messages", &message, "reactions", emoji, &user])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn reply(&self, channel: Snowflake, message: Snowflake, content: &str) -> Result<(), PlatformError> {
        let body = CreateMessage {
            content: Some(content.to_string()),
            embeds: Vec::new(),
            message_reference: Some(MessageReference { message_id: message }),
            allowed_mentions: Some(AllowedMentions::none()),
        };
        self.create_message(channel, &body).await?;
        Ok(())
    }

    async fn fetch_member(&self, guild: Snowflake, user: Snowflake) -> Result<Member, PlatformError> {
        let (guild, user) = (guild.to_string(), user.to_string());
        let url = self.endpoint(&["guilds", &guild, "members", &user])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn fetch_guild(&self, guild: Snowflake) -> Result<Guild, PlatformError> {
        let guild = guild.to_string();
        let url = self.endpoint(&["guilds", &guild])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn search_members(&self, guild: Snowflake, query: &str) -> Result<Vec<Member>, PlatformError> {
        let guild = guild.to_string();
        let mut url = self.endpoint(&["guilds", &guild, "members", "search"])?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &MEMBER_SEARCH_LIMIT.to_string());
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn send_direct_message(&self, user: Snowflake, content: &str) -> Result<(), PlatformError> {
        let url = self.endpoint(&["users", "@me", "channels"])?;
        let dm: DmChannel = self
            .send_json(self.request(Method::POST, url).json(&CreateDm { recipient_id: user }))
            .await?;

        let body = CreateMessage {
            content: Some(content.to_string()),
            embeds: Vec::new(),
            message_reference: None,
            allowed_mentions: Some(AllowedMentions::none()),
        };
        self.create_message(dm.id, &body).await?;
        Ok(())
    }
}
