use std::sync::LazyLock;

use regex::Regex;

use staffdesk_types::api::NOT_AVAILABLE;
use staffdesk_types::discord::{Embed, Message, Snowflake};

use crate::decision::{Decision, Resolution};

/// Field name fragment marking the applicant's Discord handle.
const HANDLE_FIELD: &str = "Discord Username";

/// Footer pattern carrying the spreadsheet row, e.g. `Row #7`. ASCII digits
/// only; `\d` would also take other Unicode digits.
static ROW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Row\s+#([0-9]+)").expect("row pattern is valid"));

/// Why a message is not a tracked application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotDirectory {
    #[error("expected exactly one embed, found {0}")]
    EmbedCount(usize),

    #[error("footer carries no row index")]
    MissingRowIndex,
}

/// A message in the directory channel that represents one application row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMessage {
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    pub row_index: u64,
    /// Applicant's handle as typed into the form, or `N/A`.
    pub applicant_handle: String,
    pub resolution: Resolution,
}

impl DirectoryMessage {
    pub fn from_message(message: &Message) -> Result<Self, NotDirectory> {
        let [embed] = message.embeds.as_slice() else {
            return Err(NotDirectory::EmbedCount(message.embeds.len()));
        };

        let row_index = row_index(embed).ok_or(NotDirectory::MissingRowIndex)?;

        Ok(Self {
            channel_id: message.channel_id,
            message_id: message.id,
            row_index,
            applicant_handle: applicant_handle(embed),
            resolution: Resolution::Pending,
        })
    }

    /// Whether the handle field held a usable value.
    pub fn has_applicant_handle(&self) -> bool {
        self.applicant_handle != NOT_AVAILABLE
    }

    pub fn resolve(&mut self, decision: Decision) {
        self.resolution = Resolution::Resolved(decision);
    }
}

pub fn parse_row_index(footer: &str) -> Option<u64> {
    ROW_PATTERN
        .captures(footer)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn row_index(embed: &Embed) -> Option<u64> {
    embed.footer.as_ref().and_then(|f| parse_row_index(&f.text))
}

fn applicant_handle(embed: &Embed) -> String {
    embed
        .fields
        .iter()
        .find(|f| f.name.contains(HANDLE_FIELD))
        .map(|f| f.value.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use staffdesk_types::discord::{EmbedField, EmbedFooter};

    fn message(embeds: Vec<Embed>) -> Message {
        Message {
            id: Snowflake(30),
            channel_id: Snowflake(20),
            guild_id: Some(Snowflake(10)),
            content: String::new(),
            embeds,
        }
    }

    fn embed(footer: Option<&str>, fields: &[(&str, &str)]) -> Embed {
        Embed {
            title: Some("App #7".into()),
            fields: fields
                .iter()
                .map(|(name, value)| EmbedField {
                    name: name.to_string(),
                    value: value.to_string(),
                    inline: false,
                })
                .collect(),
            footer: footer.map(|text| EmbedFooter { text: text.into() }),
            ..Embed::default()
        }
    }

    #[test]
    fn row_index_from_footer() {
        assert_eq!(parse_row_index("Row #7"), Some(7));
        assert_eq!(parse_row_index("Submitted via form • Row   #1204"), Some(1204));
        assert_eq!(parse_row_index("Row#7"), None);
        assert_eq!(parse_row_index("Row #"), None);
        assert_eq!(parse_row_index("row #7"), None);
        assert_eq!(parse_row_index("Row #-3"), None);
        assert_eq!(parse_row_index(""), None);
    }

    #[test]
    fn row_index_stops_at_non_ascii_digits() {
        assert_eq!(parse_row_index("Row #7\u{0663}"), Some(7));
        assert_eq!(parse_row_index("Row #\u{0663}"), None);
    }

    #[test]
    fn overflowing_row_index_is_not_a_row() {
        assert_eq!(parse_row_index("Row #99999999999999999999999"), None);
    }

    #[test]
    fn parses_tracked_application() {
        let msg = message(vec![embed(
            Some("Row #7"),
            &[("Team", "Hawks"), ("Discord Username", "alice#0001")],
        )]);

        let dir = DirectoryMessage::from_message(&msg).unwrap();
        assert_eq!(dir.row_index, 7);
        assert_eq!(dir.applicant_handle, "alice#0001");
        assert_eq!(dir.message_id, Snowflake(30));
        assert_eq!(dir.resolution, Resolution::Pending);
        assert!(dir.has_applicant_handle());
    }

    #[test]
    fn handle_field_matches_by_substring() {
        let msg = message(vec![embed(Some("Row #2"), &[("Your Discord Username (exact)", "bob")])]);
        assert_eq!(DirectoryMessage::from_message(&msg).unwrap().applicant_handle, "bob");
    }

    #[test]
    fn missing_or_blank_handle_falls_back() {
        let msg = message(vec![embed(Some("Row #2"), &[("Team", "Hawks")])]);
        let dir = DirectoryMessage::from_message(&msg).unwrap();
        assert_eq!(dir.applicant_handle, NOT_AVAILABLE);
        assert!(!dir.has_applicant_handle());

        let msg = message(vec![embed(Some("Row #2"), &[("Discord Username", "  ")])]);
        assert_eq!(DirectoryMessage::from_message(&msg).unwrap().applicant_handle, NOT_AVAILABLE);
    }

    #[test]
    fn rejects_untracked_messages() {
        assert_eq!(DirectoryMessage::from_message(&message(vec![])), Err(NotDirectory::EmbedCount(0)));

        let two = vec![embed(Some("Row #1"), &[]), embed(Some("Row #2"), &[])];
        assert_eq!(DirectoryMessage::from_message(&message(two)), Err(NotDirectory::EmbedCount(2)));

        let no_footer = message(vec![embed(None, &[])]);
        assert_eq!(DirectoryMessage::from_message(&no_footer), Err(NotDirectory::MissingRowIndex));

        let bad_footer = message(vec![embed(Some("Application 7"), &[])]);
        assert_eq!(DirectoryMessage::from_message(&bad_footer), Err(NotDirectory::MissingRowIndex));
    }

    #[test]
    fn resolving_records_the_decision() {
        let msg = message(vec![embed(Some("Row #7"), &[])]);
        let mut dir = DirectoryMessage::from_message(&msg).unwrap();
        dir.resolve(Decision::Approved);
        assert_eq!(dir.resolution, Resolution::Resolved(Decision::Approved));
    }
}
