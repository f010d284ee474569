//! Envelope → [`CanonicalMessage`] normalization.

use crate::envelope::{Content, ContextInfo, Envelope, MediaContent};
use crate::error::ZaydenError;
use crate::message::{CanonicalMessage, MediaInfo, QuotedMessage};

/// Build the canonical record for an envelope.
///
/// Fails only when the envelope has no content at all. Subtypes without text
/// normalize to an empty body.
pub fn normalize(envelope: &Envelope) -> Result<CanonicalMessage, ZaydenError> {
    let content = envelope.content.as_ref().ok_or_else(|| {
        ZaydenError::MalformedMessage(format!("message {} has no content", envelope.id))
    })?;

    let context = content.context();
    let quoted = context.and_then(|ctx| quoted_message(ctx, &envelope.chat_id));
    let mentioned = context.map(|ctx| ctx.mentioned.clone()).unwrap_or_default();

    Ok(CanonicalMessage {
        id: envelope.id.clone(),
        chat_id: envelope.chat_id.clone(),
        sender_id: envelope.sender_id.clone(),
        push_name: envelope.push_name.clone(),
        is_group: envelope.is_group,
        from_me: envelope.from_me,
        body: effective_text(content),
        message_type: content.kind().to_string(),
        media: content.media().map(media_info),
        quoted,
        mentioned,
        is_bot: is_bot_id(&envelope.id),
        timestamp: envelope.timestamp,
    })
}

/// Effective text of a content subtype.
pub fn effective_text(content: &Content) -> String {
    match content {
        Content::Conversation { text } | Content::ExtendedText { text, .. } => text.clone(),
        Content::Image(media) | Content::Video(media) => media.caption.clone().unwrap_or_default(),
        Content::ButtonsReply { selected_id, .. } | Content::TemplateReply { selected_id, .. } => {
            selected_id.clone()
        }
        Content::ListReply {
            selected_row_id, ..
        } => selected_row_id.clone(),
        Content::InteractiveReply { params_json, .. } => native_flow_id(params_json),
        Content::ContextInfoOnly {
            buttons_reply_id,
            list_reply_id,
            text,
        } => buttons_reply_id
            .as_ref()
            .or(list_reply_id.as_ref())
            .or(text.as_ref())
            .cloned()
            .unwrap_or_default(),
        Content::Audio(_)
        | Content::Sticker(_)
        | Content::Document(_)
        | Content::Unsupported { .. } => String::new(),
    }
}

/// `id` field of a native-flow `paramsJson`; empty when absent or unparseable.
fn native_flow_id(params_json: &str) -> String {
    serde_json::from_str::<serde_json::Value>(params_json)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
        .unwrap_or_default()
}

fn media_info(media: &MediaContent) -> MediaInfo {
    MediaInfo {
        mimetype: media.mimetype.clone(),
        size: media.file_length,
        view_once: media.view_once,
    }
}

/// One hop only: the quoted content's own context is ignored.
fn quoted_message(ctx: &ContextInfo, chat_id: &str) -> Option<QuotedMessage> {
    let content = ctx.quoted.as_deref()?;
    let id = ctx.stanza_id.clone().unwrap_or_default();
    // In private chats the participant field is often missing; the author
    // is then the chat itself.
    let sender_id = ctx
        .participant
        .clone()
        .unwrap_or_else(|| chat_id.to_string());
    Some(QuotedMessage {
        id,
        sender_id,
        body: effective_text(content),
        message_type: content.kind().to_string(),
        media: content.media().map(media_info),
    })
}

/// Message ids generated by other bot libraries.
pub fn is_bot_id(id: &str) -> bool {
    (id.starts_with("BAE5") && id.len() == 16) || (id.starts_with("3EB0") && id.len() == 12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn envelope(content: Option<Content>) -> Envelope {
        Envelope {
            id: "ABCDEF0123456789AB".into(),
            chat_id: "6281234567890@s.whatsapp.net".into(),
            sender_id: "6281234567890@s.whatsapp.net".into(),
            push_name: "Adrian".into(),
            from_me: false,
            is_group: false,
            timestamp: Utc::now(),
            content,
        }
    }

    fn media(caption: Option<&str>) -> MediaContent {
        MediaContent {
            mimetype: "image/jpeg".into(),
            file_length: 2048,
            caption: caption.map(str::to_string),
            view_once: false,
            context: None,
        }
    }

    #[test]
    fn test_missing_content_is_malformed() {
        let err = normalize(&envelope(None)).unwrap_err();
        assert!(matches!(err, ZaydenError::MalformedMessage(_)));
    }

    #[test]
    fn test_effective_text_per_subtype() {
        let cases = vec![
            (Content::Conversation { text: "hi".into() }, "hi"),
            (
                Content::ExtendedText {
                    text: "ext".into(),
                    context: None,
                },
                "ext",
            ),
            (Content::Image(media(Some("cap"))), "cap"),
            (Content::Video(media(Some("vid"))), "vid"),
            (
                Content::ButtonsReply {
                    selected_id: ".menu".into(),
                    context: None,
                },
                ".menu",
            ),
            (
                Content::ListReply {
                    selected_row_id: ".ytmp3 url".into(),
                    context: None,
                },
                ".ytmp3 url",
            ),
            (
                Content::TemplateReply {
                    selected_id: ".owner".into(),
                    context: None,
                },
                ".owner",
            ),
            (
                Content::InteractiveReply {
                    params_json: r#"{"id":".tiktokdl x"}"#.into(),
                    context: None,
                },
                ".tiktokdl x",
            ),
        ];
        for (content, expected) in cases {
            let kind = content.kind().to_string();
            let msg = normalize(&envelope(Some(content))).unwrap();
            assert_eq!(msg.body, expected, "wrong text for {kind}");
            assert_eq!(msg.message_type, kind);
        }
    }

    #[test]
    fn test_unsupported_subtypes_yield_empty_text() {
        let cases = vec![
            Content::Image(media(None)),
            Content::Audio(media(None)),
            Content::Sticker(media(None)),
            Content::Document(media(Some("ignored"))),
            Content::Unsupported {
                kind: "reactionMessage".into(),
            },
            Content::InteractiveReply {
                params_json: "not json".into(),
                context: None,
            },
        ];
        for content in cases {
            let msg = normalize(&envelope(Some(content))).unwrap();
            assert_eq!(msg.body, "");
        }
    }

    #[test]
    fn test_context_info_only_precedence() {
        let both = Content::ContextInfoOnly {
            buttons_reply_id: Some("button".into()),
            list_reply_id: Some("row".into()),
            text: Some("plain".into()),
        };
        assert_eq!(effective_text(&both), "button");

        let list = Content::ContextInfoOnly {
            buttons_reply_id: None,
            list_reply_id: Some("row".into()),
            text: Some("plain".into()),
        };
        assert_eq!(effective_text(&list), "row");

        let text = Content::ContextInfoOnly {
            buttons_reply_id: None,
            list_reply_id: None,
            text: Some("plain".into()),
        };
        assert_eq!(effective_text(&text), "plain");
    }

    #[test]
    fn test_quoted_resolved_one_hop() {
        let inner_quote = Content::Conversation {
            text: "original".into(),
        };
        let reply_to_reply = Content::ExtendedText {
            text: "first reply".into(),
            context: Some(ContextInfo {
                stanza_id: Some("ORIG".into()),
                participant: Some("111@s.whatsapp.net".into()),
                mentioned: vec![],
                quoted: Some(Box::new(inner_quote)),
            }),
        };
        let content = Content::ExtendedText {
            text: ".sticker".into(),
            context: Some(ContextInfo {
                stanza_id: Some("Q1".into()),
                participant: Some("222@s.whatsapp.net".into()),
                mentioned: vec!["333@s.whatsapp.net".into()],
                quoted: Some(Box::new(reply_to_reply)),
            }),
        };
        let msg = normalize(&envelope(Some(content))).unwrap();
        let quoted = msg.quoted.unwrap();
        assert_eq!(quoted.id, "Q1");
        assert_eq!(quoted.sender_id, "222@s.whatsapp.net");
        assert_eq!(quoted.body, "first reply");
        assert_eq!(msg.mentioned, vec!["333@s.whatsapp.net".to_string()]);
    }

    #[test]
    fn test_quoted_media_and_private_chat_author() {
        let mut img = media(None);
        img.view_once = true;
        let content = Content::ExtendedText {
            text: ".rvo".into(),
            context: Some(ContextInfo {
                stanza_id: Some("Q2".into()),
                participant: None,
                mentioned: vec![],
                quoted: Some(Box::new(Content::Image(img))),
            }),
        };
        let msg = normalize(&envelope(Some(content))).unwrap();
        let quoted = msg.quoted.as_ref().unwrap();
        assert_eq!(quoted.sender_id, msg.chat_id);
        let (id, info) = msg.target_media().unwrap();
        assert_eq!(id, "Q2");
        assert!(info.view_once);
        assert_eq!(info.size, 2048);
    }

    #[test]
    fn test_bot_id_detection() {
        assert!(is_bot_id("BAE5ABCDEF012345"));
        assert!(is_bot_id("3EB0ABCDEF01"));
        assert!(!is_bot_id("3EB0ABCDEF0123456789AB"));
        assert!(!is_bot_id("ABCDEF0123456789AB"));
    }
}
