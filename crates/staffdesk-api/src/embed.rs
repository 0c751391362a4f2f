use chrono::{DateTime, SecondsFormat, Utc};

use staffdesk_types::api::{NOT_AVAILABLE, SendEmbedRequest};
use staffdesk_types::discord::{Embed, EmbedField, EmbedFooter};

/// Embed color when the submission sets none.
pub const DEFAULT_COLOR: u32 = 0x3498DB;

/// Build the directory message embed for a submitted application.
///
/// Empty values become `N/A`, a zero or missing color becomes the default,
/// and an empty footer is dropped.
pub fn build_embed(req: &SendEmbedRequest, now: DateTime<Utc>) -> Embed {
    let fields = req
        .fields
        .iter()
        .map(|f| EmbedField {
            name: f.name.clone(),
            value: f
                .value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            inline: f.inline.unwrap_or(false),
        })
        .collect();

    let footer = req
        .footer
        .as_ref()
        .and_then(|f| f.text.as_deref())
        .filter(|text| !text.is_empty())
        .map(|text| EmbedFooter { text: text.to_string() });

    Embed {
        title: Some(req.title.clone()),
        color: Some(req.color.filter(|c| *c != 0).unwrap_or(DEFAULT_COLOR)),
        timestamp: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        fields,
        footer,
    }
}
