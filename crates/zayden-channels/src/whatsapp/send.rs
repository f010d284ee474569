//! Message sending utilities: protocol message builders, chunking, and retry logic.

use tracing::{error, warn};
use wacore_binary::jid::Jid;
use waproto::whatsapp as wa;
use whatsapp_rust::client::Client;
use whatsapp_rust::download::MediaType;
use zayden_core::{
    error::ZaydenError,
    message::{Contact, MediaKind, MessageKey},
};

/// Retry delays for exponential backoff: 500ms, 1s, 2s.
pub(super) const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Longest text body sent in one message.
pub(super) const MAX_TEXT_LEN: usize = 4096;

/// Send a WhatsApp message with retry and exponential backoff.
///
/// Attempts up to 3 times with delays of 500ms, 1s, 2s between retries.
pub(super) async fn retry_send(
    client: &Client,
    jid: &Jid,
    msg: wa::Message,
) -> Result<String, ZaydenError> {
    let mut last_err = None;

    for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
        match client.send_message(jid.clone(), msg.clone()).await {
            Ok(msg_id) => return Ok(msg_id),
            Err(e) => {
                let attempt_num = attempt + 1;
                if attempt_num < RETRY_DELAYS_MS.len() {
                    warn!(
                        "whatsapp send attempt {attempt_num}/{} failed: {e}, retrying in {delay_ms}ms",
                        RETRY_DELAYS_MS.len()
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(*delay_ms)).await;
                } else {
                    error!(
                        "whatsapp send attempt {attempt_num}/{} failed: {e}, giving up",
                        RETRY_DELAYS_MS.len()
                    );
                }
                last_err = Some(e);
            }
        }
    }

    Err(ZaydenError::Channel(format!(
        "whatsapp send failed after {} attempts: {}",
        RETRY_DELAYS_MS.len(),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Parse a JID string, mapping failures to a channel error.
pub(super) fn parse_jid(jid: &str) -> Result<Jid, ZaydenError> {
    jid.parse()
        .map_err(|e| ZaydenError::Channel(format!("invalid whatsapp JID '{jid}': {e}")))
}

/// Split text into chunks of at most `max_len` bytes.
///
/// Prefers breaking after a newline; never cuts inside a UTF-8 character.
pub(super) fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > max_len {
        let mut cut = max_len;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // A single character wider than max_len.
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        if let Some(newline) = rest[..cut].rfind('\n') {
            if newline > 0 {
                cut = newline + 1;
            }
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Reply context pointing at `key`, optionally carrying the quoted body.
pub(super) fn quote_context(key: &MessageKey, quoted: Option<wa::Message>) -> wa::ContextInfo {
    wa::ContextInfo {
        stanza_id: Some(key.id.clone()),
        participant: Some(key.sender_id.clone()),
        quoted_message: quoted.map(Into::into),
        ..Default::default()
    }
}

/// Context that only tags users.
pub(super) fn mention_context(mentions: &[String]) -> wa::ContextInfo {
    wa::ContextInfo {
        mentioned_jid: mentions.to_vec(),
        ..Default::default()
    }
}

/// Plain text, upgraded to an extended text message when it needs a context.
pub(super) fn text_message(text: &str, context: Option<wa::ContextInfo>) -> wa::Message {
    match context {
        None => wa::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        },
        Some(ctx) => wa::Message {
            extended_text_message: Some(Box::new(wa::message::ExtendedTextMessage {
                text: Some(text.to_string()),
                context_info: Some(ctx.into()),
                ..Default::default()
            })),
            ..Default::default()
        },
    }
}

/// Fields returned by a media upload, needed to reference the blob.
#[derive(Debug, Clone, Default)]
pub(super) struct UploadedMedia {
    pub url: String,
    pub direct_path: String,
    pub media_key: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
    pub file_sha256: Vec<u8>,
    pub file_length: u64,
}

/// Upload class used for media encryption.
pub(super) fn media_type(kind: MediaKind) -> MediaType {
    match kind {
        MediaKind::Image => MediaType::Image,
        MediaKind::Video => MediaType::Video,
        MediaKind::Audio => MediaType::Audio,
        MediaKind::Sticker => MediaType::Sticker,
        MediaKind::Document => MediaType::Document,
    }
}

/// Default mimetype per kind, when the caller gave none.
pub(super) fn default_mimetype(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image/jpeg",
        MediaKind::Video => "video/mp4",
        MediaKind::Audio => "audio/mpeg",
        MediaKind::Sticker => "image/webp",
        MediaKind::Document => "application/octet-stream",
    }
}

/// Parameters of one outgoing media message.
pub(super) struct MediaParts {
    pub kind: MediaKind,
    pub mimetype: String,
    pub caption: Option<String>,
    pub view_once: bool,
    pub file_name: Option<String>,
    pub context: Option<wa::ContextInfo>,
}

/// Media message referencing an uploaded blob.
pub(super) fn media_message(parts: MediaParts, up: UploadedMedia) -> wa::Message {
    let context = parts.context.map(Into::into);
    let view_once = parts.view_once.then_some(true);
    match parts.kind {
        MediaKind::Image => wa::Message {
            image_message: Some(Box::new(wa::message::ImageMessage {
                url: Some(up.url),
                direct_path: Some(up.direct_path),
                media_key: Some(up.media_key),
                file_enc_sha256: Some(up.file_enc_sha256),
                file_sha256: Some(up.file_sha256),
                file_length: Some(up.file_length),
                mimetype: Some(parts.mimetype),
                caption: parts.caption,
                view_once,
                context_info: context,
                ..Default::default()
            })),
            ..Default::default()
        },
        MediaKind::Video => wa::Message {
            video_message: Some(Box::new(wa::message::VideoMessage {
                url: Some(up.url),
                direct_path: Some(up.direct_path),
                media_key: Some(up.media_key),
                file_enc_sha256: Some(up.file_enc_sha256),
                file_sha256: Some(up.file_sha256),
                file_length: Some(up.file_length),
                mimetype: Some(parts.mimetype),
                caption: parts.caption,
                view_once,
                context_info: context,
                ..Default::default()
            })),
            ..Default::default()
        },
        MediaKind::Audio => wa::Message {
            audio_message: Some(Box::new(wa::message::AudioMessage {
                url: Some(up.url),
                direct_path: Some(up.direct_path),
                media_key: Some(up.media_key),
                file_enc_sha256: Some(up.file_enc_sha256),
                file_sha256: Some(up.file_sha256),
                file_length: Some(up.file_length),
                mimetype: Some(parts.mimetype),
                view_once,
                context_info: context,
                ..Default::default()
            })),
            ..Default::default()
        },
        MediaKind::Sticker => wa::Message {
            sticker_message: Some(Box::new(wa::message::StickerMessage {
                url: Some(up.url),
                direct_path: Some(up.direct_path),
                media_key: Some(up.media_key),
                file_enc_sha256: Some(up.file_enc_sha256),
                file_sha256: Some(up.file_sha256),
                file_length: Some(up.file_length),
                mimetype: Some(parts.mimetype),
                context_info: context,
                ..Default::default()
            })),
            ..Default::default()
        },
        MediaKind::Document => wa::Message {
            document_message: Some(Box::new(wa::message::DocumentMessage {
                url: Some(up.url),
                direct_path: Some(up.direct_path),
                media_key: Some(up.media_key),
                file_enc_sha256: Some(up.file_enc_sha256),
                file_sha256: Some(up.file_sha256),
                file_length: Some(up.file_length),
                mimetype: Some(parts.mimetype),
                file_name: Some(parts.file_name.unwrap_or_else(|| "file".to_string())),
                caption: parts.caption,
                context_info: context,
                ..Default::default()
            })),
            ..Default::default()
        },
    }
}

/// One contact card, or an array message for several.
pub(super) fn contacts_message(
    contacts: &[Contact],
    context: Option<wa::ContextInfo>,
) -> wa::Message {
    let cards: Vec<wa::message::ContactMessage> = contacts
        .iter()
        .map(|c| wa::message::ContactMessage {
            display_name: Some(c.name.clone()),
            vcard: Some(c.vcard()),
            ..Default::default()
        })
        .collect();

    match cards.as_slice() {
        [single] => wa::Message {
            contact_message: Some(Box::new(wa::message::ContactMessage {
                context_info: context.map(Into::into),
                ..single.clone()
            })),
            ..Default::default()
        },
        _ => wa::Message {
            contacts_array_message: Some(Box::new(wa::message::ContactsArrayMessage {
                display_name: Some(format!("{} contacts", cards.len())),
                contacts: cards,
                context_info: context.map(Into::into),
                ..Default::default()
            })),
            ..Default::default()
        },
    }
}

/// Revoke ("delete for everyone") of the message addressed by `key`.
pub(super) fn revoke_message(key: &MessageKey) -> wa::Message {
    let is_group = key.chat_id.ends_with("@g.us");
    let participant = (is_group && !key.from_me).then(|| key.sender_id.clone());
    wa::Message {
        protocol_message: Some(Box::new(wa::message::ProtocolMessage {
            key: Some(wa::MessageKey {
                remote_jid: Some(key.chat_id.clone()),
                from_me: Some(key.from_me),
                id: Some(key.id.clone()),
                participant,
            }),
            r#type: Some(wa::message::protocol_message::Type::Revoke as i32),
            ..Default::default()
        })),
        ..Default::default()
    }
}
