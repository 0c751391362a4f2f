use staffdesk_types::api::{APPROVE_EMOJI, DENY_EMOJI};

/// Outcome chosen by the reacting staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    /// Map a reaction emoji to a decision. Any other emoji is not a decision.
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            APPROVE_EMOJI => Some(Self::Approved),
            DENY_EMOJI => Some(Self::Denied),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Approved => APPROVE_EMOJI,
            Self::Denied => DENY_EMOJI,
        }
    }

    /// Status string written to the spreadsheet and shown in replies.
    pub fn status_label(self) -> &'static str {
        match self {
            Self::Approved => "✅ Approved",
            Self::Denied => "❌ Denied",
        }
    }
}

/// Review state of a directory message.
///
/// Nothing on the message itself records this; a message is `Pending` until
/// a staff decision is processed for it. Processing is not exactly-once, so
/// two decisions racing on one message both resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Pending,
    Resolved(Decision),
}

impl Resolution {
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}
