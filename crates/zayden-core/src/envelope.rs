//! Raw inbound message shape, as handed over by a channel adapter.
//!
//! The adapter unwraps protocol wrappers (ephemeral, view-once, device-sent)
//! and picks exactly one [`Content`] variant per message. Everything else in
//! the protocol payload is dropped here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbound message before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol message id.
    pub id: String,
    /// Chat JID (`...@g.us` for groups, `...@s.whatsapp.net` for private chats).
    pub chat_id: String,
    /// Sender JID. Equal to `chat_id` in private chats.
    pub sender_id: String,
    /// Display name chosen by the sender.
    #[serde(default)]
    pub push_name: String,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    pub timestamp: DateTime<Utc>,
    /// `None` when the payload had no content the adapter understood.
    pub content: Option<Content>,
}

/// One content subtype. Variants follow the protocol's message keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Conversation {
        text: String,
    },
    ExtendedText {
        text: String,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    Image(MediaContent),
    Video(MediaContent),
    Audio(MediaContent),
    Sticker(MediaContent),
    Document(MediaContent),
    ButtonsReply {
        selected_id: String,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    ListReply {
        selected_row_id: String,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    TemplateReply {
        selected_id: String,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    InteractiveReply {
        /// Raw `paramsJson` of the native-flow response.
        params_json: String,
        #[serde(default)]
        context: Option<ContextInfo>,
    },
    /// Only `messageContextInfo` was present; the reply ids may still be
    /// carried alongside it.
    ContextInfoOnly {
        #[serde(default)]
        buttons_reply_id: Option<String>,
        #[serde(default)]
        list_reply_id: Option<String>,
        #[serde(default)]
        text: Option<String>,
    },
    /// A subtype the bot does not act on (reactions, polls, protocol messages).
    Unsupported {
        kind: String,
    },
}

/// Media payload metadata. The bytes stay with the channel and are fetched
/// on demand through `Messenger::download_media`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaContent {
    #[serde(default)]
    pub mimetype: String,
    #[serde(default)]
    pub file_length: u64,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub view_once: bool,
    #[serde(default)]
    pub context: Option<ContextInfo>,
}

/// Reply/mention context attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextInfo {
    /// Id of the quoted message.
    #[serde(default)]
    pub stanza_id: Option<String>,
    /// Author of the quoted message.
    #[serde(default)]
    pub participant: Option<String>,
    #[serde(default)]
    pub mentioned: Vec<String>,
    /// Content of the quoted message. Its own context is never followed.
    #[serde(default)]
    pub quoted: Option<Box<Content>>,
}

impl Content {
    /// Protocol key name of this subtype, e.g. `"imageMessage"`.
    pub fn kind(&self) -> &str {
        match self {
            Self::Conversation { .. } => "conversation",
            Self::ExtendedText { .. } => "extendedTextMessage",
            Self::Image(_) => "imageMessage",
            Self::Video(_) => "videoMessage",
            Self::Audio(_) => "audioMessage",
            Self::Sticker(_) => "stickerMessage",
            Self::Document(_) => "documentMessage",
            Self::ButtonsReply { .. } => "buttonsResponseMessage",
            Self::ListReply { .. } => "listResponseMessage",
            Self::TemplateReply { .. } => "templateButtonReplyMessage",
            Self::InteractiveReply { .. } => "interactiveResponseMessage",
            Self::ContextInfoOnly { .. } => "messageContextInfo",
            Self::Unsupported { kind } => kind,
        }
    }

    /// Context info, when the subtype carries one.
    pub fn context(&self) -> Option<&ContextInfo> {
        match self {
            Self::ExtendedText { context, .. }
            | Self::ButtonsReply { context, .. }
            | Self::ListReply { context, .. }
            | Self::TemplateReply { context, .. }
            | Self::InteractiveReply { context, .. } => context.as_ref(),
            Self::Image(m) | Self::Video(m) | Self::Audio(m) | Self::Sticker(m) | Self::Document(m) => {
                m.context.as_ref()
            }
            Self::Conversation { .. } | Self::ContextInfoOnly { .. } | Self::Unsupported { .. } => {
                None
            }
        }
    }

    /// Media metadata, for the media subtypes.
    pub fn media(&self) -> Option<&MediaContent> {
        match self {
            Self::Image(m) | Self::Video(m) | Self::Audio(m) | Self::Sticker(m) | Self::Document(m) => {
                Some(m)
            }
            _ => None,
        }
    }
}
