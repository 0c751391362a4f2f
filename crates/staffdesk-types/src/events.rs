use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::discord::{Member, ReactionEmoji, Snowflake, User};

/// Gateway opcodes the bot sends or handles.
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Gateway intents.
pub mod intents {
    pub const GUILDS: u64 = 1 << 0;
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    pub const GUILD_MESSAGE_REACTIONS: u64 = 1 << 10;
    pub const MESSAGE_CONTENT: u64 = 1 << 15;
}

/// Raw frame received over the gateway socket.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayFrame {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

/// Frames sent FROM the bot TO the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GatewayCommand {
    Heartbeat { op: u8, d: Option<u64> },
    Identify { op: u8, d: Identify },
}

impl GatewayCommand {
    pub fn heartbeat(seq: Option<u64>) -> Self {
        Self::Heartbeat { op: opcode::HEARTBEAT, d: seq }
    }

    pub fn identify(token: &str, intents: u64) -> Self {
        Self::Identify {
            op: opcode::IDENTIFY,
            d: Identify {
                token: token.to_string(),
                intents,
                properties: IdentifyProperties {
                    os: std::env::consts::OS.to_string(),
                    browser: "staffdesk".to_string(),
                    device: "staffdesk".to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Identify {
    pub token: String,
    pub intents: u64,
    pub properties: IdentifyProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadyEvent {
    pub user: User,
    pub session_id: String,
}

/// `MESSAGE_REACTION_ADD` payload. Only ids are included; the message itself
/// has to be fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionAddEvent {
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub member: Option<Member>,
    pub emoji: ReactionEmoji,
}

impl ReactionAddEvent {
    /// Whether the reacting account is a bot. Only known for guild events,
    /// which carry the member object.
    pub fn is_bot(&self) -> bool {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .is_some_and(|u| u.bot)
    }
}

/// Dispatch events the bot cares about.
#[derive(Debug, Clone)]
pub enum GatewayDispatch {
    Ready(ReadyEvent),
    ReactionAdd(ReactionAddEvent),
    Other(String),
}

impl GatewayDispatch {
    pub fn decode(event_type: &str, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match event_type {
            "READY" => Self::Ready(serde_json::from_value(data)?),
            "MESSAGE_REACTION_ADD" => Self::ReactionAdd(serde_json::from_value(data)?),
            other => Self::Other(other.to_string()),
        })
    }
}
