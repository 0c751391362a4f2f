//! In-memory `ChatPlatform` that records every call, for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use staffdesk_types::discord::{Embed, Guild, Member, Message, Snowflake};

use crate::platform::{ChatPlatform, PlatformError};

/// A side-effecting call made against the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    SendEmbed { channel: Snowflake, embed: Embed },
    AddReaction { channel: Snowflake, message: Snowflake, emoji: String },
    RemoveReaction { channel: Snowflake, message: Snowflake, emoji: String, user: Snowflake },
    Reply { channel: Snowflake, message: Snowflake, content: String },
    DirectMessage { user: Snowflake, content: String },
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    FetchMessage,
    SendEmbed,
    AddReaction,
    RemoveReaction,
    Reply,
    FetchMember,
    DirectMessage,
}

#[derive(Default)]
struct FakeState {
    messages: HashMap<Snowflake, Message>,
    members: HashMap<Snowflake, Member>,
    guild: Option<Guild>,
    failures: HashSet<FailOn>,
    calls: Vec<PlatformCall>,
    next_id: u64,
}

#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guild(self, guild: Guild) -> Self {
        self.lock().guild = Some(guild);
        self
    }

    pub fn with_message(self, message: Message) -> Self {
        self.lock().messages.insert(message.id, message);
        self
    }

    /// Register a member; keyed by their user id.
    pub fn with_member(self, member: Member) -> Self {
        if let Some(id) = member.user.as_ref().map(|u| u.id) {
            self.lock().members.insert(id, member);
        }
        self
    }

    pub fn failing(self, op: FailOn) -> Self {
        self.lock().failures.insert(op);
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, op: FailOn) -> Result<(), PlatformError> {
        if self.lock().failures.contains(&op) {
            return Err(PlatformError::Status {
                status: 403,
                body: format!("{:?} refused by fake", op),
            });
        }
        Ok(())
    }

    fn record(&self, call: PlatformCall) {
        self.lock().calls.push(call);
    }
}

fn not_found(what: &str) -> PlatformError {
    PlatformError::Status {
        status: 404,
        body: format!("unknown {}", what),
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn fetch_message(&self, _channel: Snowflake, message: Snowflake) -> Result<Message, PlatformError> {
        self.check(FailOn::FetchMessage)?;
        self.lock().messages.get(&message).cloned().ok_or_else(|| not_found("message"))
    }

    async fn send_embed(&self, channel: Snowflake, embed: &Embed) -> Result<Message, PlatformError> {
        self.check(FailOn::SendEmbed)?;
        self.record(PlatformCall::SendEmbed { channel, embed: embed.clone() });

        let mut state = self.lock();
        state.next_id += 1;
        let message = Message {
            id: Snowflake(900_000 + state.next_id),
            channel_id: channel,
            guild_id: state.guild.as_ref().map(|g| g.id),
            content: String::new(),
            embeds: vec![embed.clone()],
        };
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn add_reaction(&self, channel: Snowflake, message: Snowflake, emoji: &str) -> Result<(), PlatformError> {
        self.check(FailOn::AddReaction)?;
        self.record(PlatformCall::AddReaction { channel, message, emoji: emoji.to_string() });
        Ok(())
    }

    async fn remove_user_reaction(
        &self,
        channel: Snowflake,
        message: Snowflake,
        emoji: &str,
        user: Snowflake,
    ) -> Result<(), PlatformError> {
        self.check(FailOn::RemoveReaction)?;
        self.record(PlatformCall::RemoveReaction { channel, message, emoji: emoji.to_string(), user });
        Ok(())
    }

    async fn reply(&self, channel: Snowflake, message: Snowflake, content: &str) -> Result<(), PlatformError> {
        self.check(FailOn::Reply)?;
        self.record(PlatformCall::Reply { channel, message, content: content.to_string() });
        Ok(())
    }

    async fn fetch_member(&self, _guild: Snowflake, user: Snowflake) -> Result<Member, PlatformError> {
        self.check(FailOn::FetchMember)?;
        self.lock().members.get(&user).cloned().ok_or_else(|| not_found("member"))
    }

    async fn fetch_guild(&self, _guild: Snowflake) -> Result<Guild, PlatformError> {
        self.lock().guild.clone().ok_or_else(|| not_found("guild"))
    }

    async fn search_members(&self, _guild: Snowflake, query: &str) -> Result<Vec<Member>, PlatformError> {
        let query = query.to_lowercase();
        Ok(self
            .lock()
            .members
            .values()
            .filter(|m| {
                m.user.as_ref().is_some_and(|u| u.username.to_lowercase().starts_with(&query))
                    || m.nick.as_ref().is_some_and(|n| n.to_lowercase().starts_with(&query))
            })
            .cloned()
            .collect())
    }

    async fn send_direct_message(&self, user: Snowflake, content: &str) -> Result<(), PlatformError> {
        self.check(FailOn::DirectMessage)?;
        self.record(PlatformCall::DirectMessage { user, content: content.to_string() });
        Ok(())
    }
}
