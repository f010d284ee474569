//! Incoming WhatsApp message handling: unwrapping, conversion to
//! [`Envelope`], and forwarding.

use super::cache::MessageCache;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use wacore::types::message::MessageInfo;
use waproto::whatsapp as wa;
use zayden_core::envelope::{Content, ContextInfo, Envelope, MediaContent};

/// Process an incoming WhatsApp message event.
pub(super) async fn handle_whatsapp_message(
    msg: wa::Message,
    info: MessageInfo,
    tx: &mpsc::Sender<Envelope>,
    sent_ids: &Arc<Mutex<HashSet<String>>>,
    messages: &Arc<Mutex<MessageCache>>,
) {
    debug!(
        "WA msg: is_group={}, is_from_me={}, sender={}, chat={}",
        info.source.is_group, info.source.is_from_me, info.source.sender.user, info.source.chat.user,
    );

    if sent_ids.lock().await.remove(&info.id) {
        debug!("skipping own echo: {}", info.id);
        return;
    }

    let (inner, view_once) = unwrap_message(&msg);

    if is_revoke(inner) {
        debug!("skipping revoke notice {}", info.id);
        return;
    }

    let envelope = envelope_of(&info, inner, view_once);

    {
        let mut cache = messages.lock().await;
        if let Some((id, quoted)) = quoted_raw(inner) {
            cache.insert_if_absent(id, quoted);
        }
        cache.insert(info.id.clone(), inner.clone());
        debug!("message cache holds {} entries", cache.len());
    }

    if tx.send(envelope).await.is_err() {
        info!("whatsapp channel receiver dropped");
    }
}

/// Strip device-sent, ephemeral and view-once wrappers.
///
/// Returns the innermost message and whether a view-once wrapper was seen.
pub(super) fn unwrap_message(msg: &wa::Message) -> (&wa::Message, bool) {
    let mut current = msg;
    let mut view_once = false;
    // Wrappers nest at most a few levels deep (ephemeral around view-once).
    for _ in 0..4 {
        if let Some(inner) = current
            .device_sent_message
            .as_ref()
            .and_then(|d| d.message.as_deref())
        {
            current = inner;
        } else if let Some(inner) = current
            .ephemeral_message
            .as_ref()
            .and_then(|e| e.message.as_deref())
        {
            current = inner;
        } else if let Some(inner) = current
            .view_once_message
            .as_ref()
            .or(current.view_once_message_v2.as_ref())
            .or(current.view_once_message_v2_extension.as_ref())
            .and_then(|v| v.message.as_deref())
        {
            view_once = true;
            current = inner;
        } else {
            break;
        }
    }
    (current, view_once)
}

fn is_revoke(msg: &wa::Message) -> bool {
    msg.protocol_message
        .as_ref()
        .is_some_and(|p| p.r#type == Some(wa::message::protocol_message::Type::Revoke as i32))
}

/// Envelope for an unwrapped message, stamped with the server-side send time.
pub(super) fn envelope_of(info: &MessageInfo, inner: &wa::Message, view_once: bool) -> Envelope {
    Envelope {
        id: info.id.clone(),
        chat_id: info.source.chat.to_string(),
        sender_id: info.source.sender.to_string(),
        push_name: info.push_name.clone(),
        from_me: info.source.is_from_me,
        is_group: info.source.is_group,
        timestamp: info.timestamp,
        content: content_of(inner, view_once),
    }
}

/// Map the first present content key to a [`Content`] variant.
///
/// `None` when the message carries nothing recognizable at all.
pub(super) fn content_of(m: &wa::Message, view_once: bool) -> Option<Content> {
    if let Some(ref text) = m.conversation {
        return Some(Content::Conversation { text: text.clone() });
    }
    if let Some(ref ext) = m.extended_text_message {
        return Some(Content::ExtendedText {
            text: ext.text.clone().unwrap_or_default(),
            context: ext.context_info.as_ref().map(|c| context_of(c)),
        });
    }
    if let Some(ref img) = m.image_message {
        return Some(Content::Image(MediaContent {
            mimetype: img.mimetype.clone().unwrap_or_else(|| "image/jpeg".into()),
            file_length: img.file_length.unwrap_or(0),
            caption: img.caption.clone(),
            view_once: view_once || img.view_once.unwrap_or(false),
            context: img.context_info.as_ref().map(|c| context_of(c)),
        }));
    }
    if let Some(ref video) = m.video_message {
        return Some(Content::Video(MediaContent {
            mimetype: video.mimetype.clone().unwrap_or_else(|| "video/mp4".into()),
            file_length: video.file_length.unwrap_or(0),
            caption: video.caption.clone(),
            view_once: view_once || video.view_once.unwrap_or(false),
            context: video.context_info.as_ref().map(|c| context_of(c)),
        }));
    }
    if let Some(ref audio) = m.audio_message {
        return Some(Content::Audio(MediaContent {
            mimetype: audio.mimetype.clone().unwrap_or_else(|| "audio/ogg".into()),
            file_length: audio.file_length.unwrap_or(0),
            caption: None,
            view_once: view_once || audio.view_once.unwrap_or(false),
            context: audio.context_info.as_ref().map(|c| context_of(c)),
        }));
    }
    if let Some(ref sticker) = m.sticker_message {
        return Some(Content::Sticker(MediaContent {
            mimetype: sticker.mimetype.clone().unwrap_or_else(|| "image/webp".into()),
            file_length: sticker.file_length.unwrap_or(0),
            caption: None,
            view_once,
            context: sticker.context_info.as_ref().map(|c| context_of(c)),
        }));
    }
    if let Some(ref doc) = m.document_message {
        return Some(Content::Document(MediaContent {
            mimetype: doc
                .mimetype
                .clone()
                .unwrap_or_else(|| "application/octet-stream".into()),
            file_length: doc.file_length.unwrap_or(0),
            caption: doc.caption.clone(),
            view_once,
            context: doc.context_info.as_ref().map(|c| context_of(c)),
        }));
    }
    if let Some(ref reply) = m.buttons_response_message {
        return Some(Content::ButtonsReply {
            selected_id: reply.selected_button_id.clone().unwrap_or_default(),
            context: reply.context_info.as_ref().map(|c| context_of(c)),
        });
    }
    if let Some(ref reply) = m.list_response_message {
        return Some(Content::ListReply {
            selected_row_id: reply
                .single_select_reply
                .as_ref()
                .and_then(|s| s.selected_row_id.clone())
                .unwrap_or_default(),
            context: reply.context_info.as_ref().map(|c| context_of(c)),
        });
    }
    if let Some(ref reply) = m.template_button_reply_message {
        return Some(Content::TemplateReply {
            selected_id: reply.selected_id.clone().unwrap_or_default(),
            context: reply.context_info.as_ref().map(|c| context_of(c)),
        });
    }
    if let Some(ref reply) = m.interactive_response_message {
        use wa::message::interactive_response_message::InteractiveResponseMessage as Response;
        let params_json = match reply.interactive_response_message {
            Some(Response::NativeFlowResponseMessage(ref flow)) => {
                flow.params_json.clone().unwrap_or_default()
            }
            _ => String::new(),
        };
        return Some(Content::InteractiveReply {
            params_json,
            context: reply.context_info.as_ref().map(|c| context_of(c)),
        });
    }
    if m.message_context_info.is_some() {
        return Some(Content::ContextInfoOnly {
            buttons_reply_id: None,
            list_reply_id: None,
            text: sibling_text(m),
        });
    }
    if let Some(kind) = unsupported_kind(m) {
        return Some(Content::Unsupported { kind: kind.into() });
    }
    (*m != wa::Message::default()).then(|| Content::Unsupported {
        kind: "unknown".into(),
    })
}

/// Text carried next to a bare context-info block by subtypes without a
/// dedicated variant.
fn sibling_text(m: &wa::Message) -> Option<String> {
    let poll = [
        &m.poll_creation_message,
        &m.poll_creation_message_v2,
        &m.poll_creation_message_v3,
    ]
    .into_iter()
    .find_map(|p| p.as_ref().and_then(|p| p.name.clone()));
    poll.or_else(|| {
        m.buttons_message
            .as_ref()
            .and_then(|b| b.content_text.clone())
    })
    .or_else(|| m.ptv_message.as_ref().and_then(|v| v.caption.clone()))
    .filter(|t| !t.is_empty())
}

/// Protocol key of a content subtype this bot does not interpret.
fn unsupported_kind(m: &wa::Message) -> Option<&'static str> {
    let kinds = [
        (m.protocol_message.is_some(), "protocolMessage"),
        (m.reaction_message.is_some(), "reactionMessage"),
        (m.contact_message.is_some(), "contactMessage"),
        (m.contacts_array_message.is_some(), "contactsArrayMessage"),
        (m.location_message.is_some(), "locationMessage"),
        (m.live_location_message.is_some(), "liveLocationMessage"),
        (m.poll_creation_message.is_some(), "pollCreationMessage"),
        (m.poll_update_message.is_some(), "pollUpdateMessage"),
        (
            m.sender_key_distribution_message.is_some(),
            "senderKeyDistributionMessage",
        ),
    ];
    kinds
        .into_iter()
        .find_map(|(present, kind)| present.then_some(kind))
}

/// Context info of a message, with the quote resolved one level deep.
pub(super) fn context_of(ctx: &wa::ContextInfo) -> ContextInfo {
    let quoted = ctx.quoted_message.as_ref().and_then(|q| {
        let (inner, view_once) = unwrap_message(q);
        content_of(inner, view_once).map(|content| Box::new(strip_context(content)))
    });
    ContextInfo {
        stanza_id: ctx.stanza_id.clone(),
        participant: ctx.participant.clone(),
        mentioned: ctx.mentioned_jid.clone(),
        quoted,
    }
}

/// Drop the quote's own context so quotes never chain.
fn strip_context(content: Content) -> Content {
    match content {
        Content::ExtendedText { text, .. } => Content::ExtendedText {
            text,
            context: None,
        },
        Content::Image(m) => Content::Image(without_context(m)),
        Content::Video(m) => Content::Video(without_context(m)),
        Content::Audio(m) => Content::Audio(without_context(m)),
        Content::Sticker(m) => Content::Sticker(without_context(m)),
        Content::Document(m) => Content::Document(without_context(m)),
        Content::ButtonsReply { selected_id, .. } => Content::ButtonsReply {
            selected_id,
            context: None,
        },
        Content::ListReply {
            selected_row_id, ..
        } => Content::ListReply {
            selected_row_id,
            context: None,
        },
        Content::TemplateReply { selected_id, .. } => Content::TemplateReply {
            selected_id,
            context: None,
        },
        Content::InteractiveReply { params_json, .. } => Content::InteractiveReply {
            params_json,
            context: None,
        },
        other => other,
    }
}

fn without_context(media: MediaContent) -> MediaContent {
    MediaContent {
        context: None,
        ..media
    }
}

/// The quoted raw message and its id, for caching.
fn quoted_raw(m: &wa::Message) -> Option<(String, wa::Message)> {
    let ctx = raw_context(m)?;
    let id = ctx.stanza_id.clone()?;
    let quoted = ctx.quoted_message.as_ref()?;
    let (inner, _) = unwrap_message(quoted);
    Some((id, inner.clone()))
}

/// Raw context info of the first content key that carries one.
pub(super) fn raw_context(m: &wa::Message) -> Option<&wa::ContextInfo> {
    fn ctx(c: &wa::ContextInfo) -> &wa::ContextInfo {
        c
    }
    m.extended_text_message
        .as_ref()
        .and_then(|e| e.context_info.as_ref().map(|c| ctx(c)))
        .or_else(|| {
            m.image_message
                .as_ref()
                .and_then(|i| i.context_info.as_ref().map(|c| ctx(c)))
        })
        .or_else(|| {
            m.video_message
                .as_ref()
                .and_then(|v| v.context_info.as_ref().map(|c| ctx(c)))
        })
        .or_else(|| {
            m.audio_message
                .as_ref()
                .and_then(|a| a.context_info.as_ref().map(|c| ctx(c)))
        })
        .or_else(|| {
            m.sticker_message
                .as_ref()
                .and_then(|s| s.context_info.as_ref().map(|c| ctx(c)))
        })
        .or_else(|| {
            m.document_message
                .as_ref()
                .and_then(|d| d.context_info.as_ref().map(|c| ctx(c)))
        })
}
