use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized, handler-facing view of an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub push_name: String,
    pub is_group: bool,
    pub from_me: bool,
    /// Effective text of the message (see `normalize::effective_text`).
    pub body: String,
    /// Protocol key of the content subtype, e.g. `"conversation"`.
    pub message_type: String,
    pub media: Option<MediaInfo>,
    pub quoted: Option<QuotedMessage>,
    /// JIDs mentioned in the message.
    pub mentioned: Vec<String>,
    /// Sent by another bot library (detected from the message id shape).
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
}

/// The message being replied to. Carries no quote of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotedMessage {
    pub id: String,
    pub sender_id: String,
    pub body: String,
    pub message_type: String,
    pub media: Option<MediaInfo>,
}

/// Media metadata for a message or its quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub mimetype: String,
    pub size: u64,
    pub view_once: bool,
}

/// Addresses one message in one chat, for deletion and quoting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageKey {
    pub chat_id: String,
    pub id: String,
    pub sender_id: String,
    pub from_me: bool,
}

impl CanonicalMessage {
    /// Key of this message.
    pub fn key(&self) -> MessageKey {
        MessageKey {
            chat_id: self.chat_id.clone(),
            id: self.id.clone(),
            sender_id: self.sender_id.clone(),
            from_me: self.from_me,
        }
    }

    /// Key of the quoted message, if any. `own_id` decides `from_me`.
    pub fn quoted_key(&self, own_id: Option<&str>) -> Option<MessageKey> {
        self.quoted.as_ref().map(|q| MessageKey {
            chat_id: self.chat_id.clone(),
            id: q.id.clone(),
            sender_id: q.sender_id.clone(),
            from_me: own_id.is_some_and(|own| crate::phone::same_user(own, &q.sender_id)),
        })
    }

    pub fn is_media(&self) -> bool {
        self.media.is_some()
    }

    /// The quoted message's media if there is a quote, otherwise this
    /// message's own media. Handlers act on "the quoted or current" media.
    pub fn target_media(&self) -> Option<(&str, &MediaInfo)> {
        match self.quoted {
            Some(ref q) => q.media.as_ref().map(|m| (q.id.as_str(), m)),
            None => self.media.as_ref().map(|m| (self.id.as_str(), m)),
        }
    }
}

/// Kind of outgoing media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Sticker,
    Document,
}

impl MediaKind {
    /// Pick a kind from a mimetype (`image/webp` counts as a sticker).
    pub fn from_mimetype(mimetype: &str) -> Self {
        if mimetype == "image/webp" {
            Self::Sticker
        } else if mimetype.starts_with("image/") {
            Self::Image
        } else if mimetype.starts_with("video/") {
            Self::Video
        } else if mimetype.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Document
        }
    }
}

/// Where outgoing media bytes come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaSource {
    Bytes(Vec<u8>),
    Url(String),
}

/// Media reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMedia {
    pub kind: MediaKind,
    pub source: MediaSource,
    pub caption: Option<String>,
    pub mimetype: Option<String>,
    /// Re-send as view-once.
    #[serde(default)]
    pub view_once: bool,
}

impl OutgoingMedia {
    pub fn new(kind: MediaKind, source: MediaSource) -> Self {
        Self {
            kind,
            source,
            caption: None,
            mimetype: None,
            view_once: false,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }
}

/// Contact card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub number: String,
}

impl Contact {
    /// Minimal vCard 3.0 with a WhatsApp id field.
    pub fn vcard(&self) -> String {
        let digits = crate::phone::digits(&self.number);
        format!(
            "BEGIN:VCARD\nVERSION:3.0\nFN:{}\nTEL;type=CELL;type=VOICE;waid={digits}:+{digits}\nEND:VCARD",
            self.name
        )
    }
}

/// Interactive choice menu. Each row carries the command text that picking
/// it should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMenu {
    pub title: String,
    pub footer: String,
    pub sections: Vec<ListSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRow {
    pub title: String,
    pub description: String,
    pub command: String,
}

impl ListMenu {
    /// Plain-text rendering, used by channels without native list support.
    pub fn render_text(&self) -> String {
        let mut out = format!("*{}*\n", self.title);
        let mut n = 1;
        for section in &self.sections {
            out.push_str(&format!("\n_{}_\n", section.title));
            for row in &section.rows {
                out.push_str(&format!("{n}. {}", row.title));
                if !row.description.is_empty() {
                    out.push_str(&format!(" ({})", row.description));
                }
                out.push_str(&format!("\n   {}\n", row.command));
                n += 1;
            }
        }
        if !self.footer.is_empty() {
            out.push_str(&format!("\n{}", self.footer));
        }
        out
    }
}

/// Group membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantAction {
    Add,
    Remove,
}
