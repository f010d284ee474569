use super::cache::MessageCache;
use super::events::{content_of, context_of, envelope_of, unwrap_message};
use super::qr::generate_qr_terminal;
use super::send::{
    contacts_message, quote_context, revoke_message, split_message, text_message, RETRY_DELAYS_MS,
};
use wacore_binary::jid::{Jid, JidExt};
use waproto::whatsapp as wa;
use zayden_core::envelope::Content;
use zayden_core::message::{Contact, MessageKey};

fn text(s: &str) -> wa::Message {
    wa::Message {
        conversation: Some(s.to_string()),
        ..Default::default()
    }
}

fn image(caption: &str) -> wa::Message {
    wa::Message {
        image_message: Some(Box::new(wa::message::ImageMessage {
            mimetype: Some("image/png".into()),
            caption: Some(caption.into()),
            file_length: Some(2048),
            ..Default::default()
        })),
        ..Default::default()
    }
}

#[test]
fn test_split_short_message() {
    assert_eq!(split_message("hello", 4096), vec!["hello"]);
    assert_eq!(split_message("", 4096), vec![""]);
}

#[test]
fn test_split_long_message_prefers_newlines() {
    let text = "a\n".repeat(3000);
    let chunks = split_message(&text, 4096);
    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.len() <= 4096);
        assert!(chunk.ends_with('\n'));
    }
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_split_respects_char_boundaries() {
    // 3-byte characters with no newline; a byte cut at 10 would split one.
    let text = "€".repeat(10);
    let chunks = split_message(&text, 10);
    for chunk in &chunks {
        assert!(chunk.len() <= 10);
        assert_eq!(chunk.chars().count() * 3, chunk.len());
    }
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_retry_delays() {
    assert_eq!(RETRY_DELAYS_MS, [500, 1000, 2000]);
}

#[test]
fn test_jid_group_detection() {
    let group_jid: Jid = "120363001234567890@g.us".parse().unwrap();
    assert!(group_jid.is_group());
    let personal_jid: Jid = "5511999887766@s.whatsapp.net".parse().unwrap();
    assert!(!personal_jid.is_group());
}

#[test]
fn test_generate_qr_terminal() {
    let qr = generate_qr_terminal("test-data").unwrap();
    assert!(!qr.is_empty());
    assert!(qr.lines().count() > 5);
}

#[test]
fn test_conversation_takes_precedence() {
    let mut msg = image("caption");
    msg.conversation = Some("plain".into());
    let content = content_of(&msg, false).unwrap();
    assert_eq!(
        content,
        Content::Conversation {
            text: "plain".into()
        }
    );
}

#[test]
fn test_image_content() {
    let content = content_of(&image("hi"), false).unwrap();
    let Content::Image(media) = content else {
        panic!("expected image");
    };
    assert_eq!(media.mimetype, "image/png");
    assert_eq!(media.file_length, 2048);
    assert_eq!(media.caption.as_deref(), Some("hi"));
    assert!(!media.view_once);
}

#[test]
fn test_view_once_wrapper_sets_flag() {
    let wrapped = wa::Message {
        view_once_message_v2: Some(Box::new(wa::message::FutureProofMessage {
            message: Some(Box::new(image(""))),
        })),
        ..Default::default()
    };
    let (inner, view_once) = unwrap_message(&wrapped);
    assert!(view_once);
    let Some(Content::Image(media)) = content_of(inner, view_once) else {
        panic!("expected image");
    };
    assert!(media.view_once);
}

#[test]
fn test_ephemeral_wrapper_unwrapped() {
    let wrapped = wa::Message {
        ephemeral_message: Some(Box::new(wa::message::FutureProofMessage {
            message: Some(Box::new(text("inside"))),
        })),
        ..Default::default()
    };
    let (inner, view_once) = unwrap_message(&wrapped);
    assert!(!view_once);
    assert_eq!(inner.conversation.as_deref(), Some("inside"));
}

#[test]
fn test_list_reply_row_id() {
    let msg = wa::Message {
        list_response_message: Some(Box::new(wa::message::ListResponseMessage {
            single_select_reply: Some(wa::message::list_response_message::SingleSelectReply {
                selected_row_id: Some(".menu".into()),
            }),
            ..Default::default()
        })),
        ..Default::default()
    };
    assert_eq!(
        content_of(&msg, false),
        Some(Content::ListReply {
            selected_row_id: ".menu".into(),
            context: None
        })
    );
}

#[test]
fn test_unsupported_and_empty() {
    let reaction = wa::Message {
        reaction_message: Some(wa::message::ReactionMessage::default().into()),
        ..Default::default()
    };
    assert_eq!(
        content_of(&reaction, false),
        Some(Content::Unsupported {
            kind: "reactionMessage".into()
        })
    );
    assert_eq!(content_of(&wa::Message::default(), false), None);
}

#[test]
fn test_unrecognised_subtype_is_unknown() {
    let ptv = wa::Message {
        ptv_message: Some(Box::new(wa::message::VideoMessage::default())),
        ..Default::default()
    };
    assert_eq!(
        content_of(&ptv, false),
        Some(Content::Unsupported {
            kind: "unknown".into()
        })
    );
}

#[test]
fn test_context_info_only_takes_sibling_text() {
    let poll = wa::Message {
        message_context_info: Some(wa::MessageContextInfo::default()),
        poll_creation_message: Some(Box::new(wa::message::PollCreationMessage {
            name: Some("Lunch?".into()),
            ..Default::default()
        })),
        ..Default::default()
    };
    assert_eq!(
        content_of(&poll, false),
        Some(Content::ContextInfoOnly {
            buttons_reply_id: None,
            list_reply_id: None,
            text: Some("Lunch?".into()),
        })
    );

    let bare = wa::Message {
        message_context_info: Some(wa::MessageContextInfo::default()),
        ..Default::default()
    };
    assert_eq!(
        content_of(&bare, false),
        Some(Content::ContextInfoOnly {
            buttons_reply_id: None,
            list_reply_id: None,
            text: None,
        })
    );
}

#[test]
fn test_envelope_uses_server_timestamp() {
    let sent = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let info = wacore::types::message::MessageInfo {
        id: "3EB0ABCDEF12".into(),
        push_name: "Budi".into(),
        timestamp: sent,
        ..Default::default()
    };
    let envelope = envelope_of(&info, &text("hi"), false);
    assert_eq!(envelope.timestamp, sent);
    assert_eq!(envelope.push_name, "Budi");
    assert_eq!(
        envelope.content,
        Some(Content::Conversation { text: "hi".into() })
    );
}

#[test]
fn test_quote_resolved_one_level() {
    let inner_ctx = wa::ContextInfo {
        stanza_id: Some("DEEP".into()),
        quoted_message: Some(text("deeper").into()),
        ..Default::default()
    };
    let quoted = wa::Message {
        extended_text_message: Some(Box::new(wa::message::ExtendedTextMessage {
            text: Some("quoted body".into()),
            context_info: Some(inner_ctx.into()),
            ..Default::default()
        })),
        ..Default::default()
    };
    let ctx = wa::ContextInfo {
        stanza_id: Some("Q1".into()),
        participant: Some("628111@s.whatsapp.net".into()),
        mentioned_jid: vec!["628222@s.whatsapp.net".into()],
        quoted_message: Some(quoted.into()),
        ..Default::default()
    };

    let info = context_of(&ctx);
    assert_eq!(info.stanza_id.as_deref(), Some("Q1"));
    assert_eq!(info.mentioned, vec!["628222@s.whatsapp.net".to_string()]);
    let quoted = info.quoted.unwrap();
    assert_eq!(
        *quoted,
        Content::ExtendedText {
            text: "quoted body".into(),
            context: None
        }
    );
}

#[test]
fn test_quoted_text_becomes_extended() {
    let key = MessageKey {
        chat_id: "628111@s.whatsapp.net".into(),
        id: "ABC".into(),
        sender_id: "628111@s.whatsapp.net".into(),
        from_me: false,
    };
    let plain = text_message("hi", None);
    assert_eq!(plain.conversation.as_deref(), Some("hi"));

    let quoted = text_message("hi", Some(quote_context(&key, Some(text("orig")))));
    assert!(quoted.conversation.is_none());
    let ext = quoted.extended_text_message.unwrap();
    let ctx = ext.context_info.unwrap();
    assert_eq!(ctx.stanza_id.as_deref(), Some("ABC"));
    assert!(ctx.quoted_message.is_some());
}

#[test]
fn test_revoke_key_in_group() {
    let key = MessageKey {
        chat_id: "1203630@g.us".into(),
        id: "XYZ".into(),
        sender_id: "628111@s.whatsapp.net".into(),
        from_me: false,
    };
    let msg = revoke_message(&key);
    let proto = msg.protocol_message.unwrap();
    assert_eq!(
        proto.r#type,
        Some(wa::message::protocol_message::Type::Revoke as i32)
    );
    let k = proto.key.unwrap();
    assert_eq!(k.remote_jid.as_deref(), Some("1203630@g.us"));
    assert_eq!(k.id.as_deref(), Some("XYZ"));
    assert_eq!(k.participant.as_deref(), Some("628111@s.whatsapp.net"));
    assert_eq!(k.from_me, Some(false));
}

#[test]
fn test_revoke_own_message_has_no_participant() {
    let key = MessageKey {
        chat_id: "628111@s.whatsapp.net".into(),
        id: "XYZ".into(),
        sender_id: "628999@s.whatsapp.net".into(),
        from_me: true,
    };
    let k = revoke_message(&key).protocol_message.unwrap().key.unwrap();
    assert!(k.participant.is_none());
    assert_eq!(k.from_me, Some(true));
}

#[test]
fn test_contacts_single_and_array() {
    let one = vec![Contact {
        name: "Owner".into(),
        number: "628123".into(),
    }];
    let single = contacts_message(&one, None);
    assert!(single.contact_message.is_some());

    let two = vec![one[0].clone(), one[0].clone()];
    let many = contacts_message(&two, None);
    assert_eq!(many.contacts_array_message.unwrap().contacts.len(), 2);
}

#[test]
fn test_cache_evicts_oldest() {
    let mut cache = MessageCache::new(2);
    cache.insert("a".into(), text("1"));
    cache.insert("b".into(), text("2"));
    cache.insert("c".into(), text("3"));
    assert!(cache.get("a").is_none());
    assert!(cache.get("b").is_some());
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cache_insert_if_absent_keeps_original() {
    let mut cache = MessageCache::new(4);
    cache.insert("a".into(), text("full"));
    cache.insert_if_absent("a".into(), text("quote copy"));
    assert_eq!(
        cache.get("a").and_then(|m| m.conversation.as_deref()),
        Some("full")
    );
}
