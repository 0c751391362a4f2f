//! Applicant lookup and the texts the bot sends.

use staffdesk_discord::{ChatPlatform, PlatformError};
use staffdesk_types::discord::{Member, Snowflake};

use crate::decision::Decision;

/// Whether `member`'s tag or username is `handle`, ignoring case.
pub fn matches_handle(member: &Member, handle: &str) -> bool {
    let Some(user) = member.user.as_ref() else {
        return false;
    };
    let handle = handle.trim().to_lowercase();
    user.tag().to_lowercase() == handle || user.username.to_lowercase() == handle
}

/// Find the guild member an application was filed by.
///
/// The platform search is by username prefix, so any `#discriminator` is
/// stripped for the query and the exact match happens here.
pub async fn find_applicant(
    platform: &dyn ChatPlatform,
    guild: Snowflake,
    handle: &str,
) -> Result<Option<Member>, PlatformError> {
    let query = handle.split('#').next().unwrap_or(handle).trim();
    if query.is_empty() {
        return Ok(None);
    }

    let candidates = platform.search_members(guild, query).await?;
    Ok(candidates.into_iter().find(|m| matches_handle(m, handle)))
}

pub fn applicant_message(decision: Decision, guild_name: &str) -> String {
    match decision {
        Decision::Approved => format!(
            "🎉 Congratulations! Your application to **{}** has been approved. Welcome aboard!",
            guild_name
        ),
        Decision::Denied => format!(
            "We're sorry, your application to **{}** was not approved this time. Thank you for applying.",
            guild_name
        ),
    }
}

pub fn confirmation_message(decision: Decision, reviewer: &str) -> String {
    format!("Application **{}** by {}", decision.status_label(), reviewer)
}

pub fn permission_denied_message(actor: &str) -> String {
    format!(
        "{}, you don't have permission to approve or deny applications.",
        actor
    )
}
