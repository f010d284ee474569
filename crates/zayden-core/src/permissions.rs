//! Authorization classifier: derives per-message permission facts.
//!
//! Pure: reads the allow-lists and group metadata, never mutates them.

use crate::group::GroupMetadata;
use crate::message::CanonicalMessage;
use crate::phone;

/// Allow-lists consulted for one message.
#[derive(Debug, Clone, Copy)]
pub struct AllowLists<'a> {
    /// Owner numbers from config.
    pub owners: &'a [String],
    pub premium: &'a [String],
    pub known_users: &'a [String],
}

/// Permission facts for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionFacts {
    pub is_owner: bool,
    /// Premium members; owners are always premium.
    pub is_premium: bool,
    pub is_known_user: bool,
    pub is_group_admin: bool,
    pub is_bot_group_admin: bool,
    pub is_group_creator: bool,
}

/// Roles a handler can require; used for denial replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Premium,
    GroupChat,
    GroupAdmin,
    BotGroupAdmin,
}

/// Classify a message.
///
/// Group flags are only set when the message comes from a group and
/// metadata is available; `bot_id` is the bot's own JID.
pub fn classify(
    msg: &CanonicalMessage,
    lists: AllowLists<'_>,
    group: Option<&GroupMetadata>,
    bot_id: Option<&str>,
) -> PermissionFacts {
    let is_owner = phone::contains(lists.owners, &msg.sender_id);
    let is_premium = is_owner || phone::contains(lists.premium, &msg.sender_id);
    let is_known_user = phone::contains(lists.known_users, &msg.sender_id);

    let (is_group_admin, is_bot_group_admin, is_group_creator) = match group {
        Some(meta) if msg.is_group => (
            meta.is_admin(&msg.sender_id),
            bot_id.is_some_and(|bot| meta.is_admin(bot)),
            meta.is_creator(&msg.sender_id),
        ),
        _ => (false, false, false),
    };

    PermissionFacts {
        is_owner,
        is_premium,
        is_known_user,
        is_group_admin,
        is_bot_group_admin,
        is_group_creator,
    }
}

impl PermissionFacts {
    /// Check a required role; `is_group` comes from the message.
    pub fn satisfies(&self, role: Role, is_group: bool) -> bool {
        match role {
            Role::Owner => self.is_owner,
            Role::Premium => self.is_premium,
            Role::GroupChat => is_group,
            Role::GroupAdmin => self.is_group_admin,
            Role::BotGroupAdmin => self.is_bot_group_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Participant, ParticipantRole};
    use chrono::Utc;

    fn message(sender: &str, is_group: bool) -> CanonicalMessage {
        CanonicalMessage {
            id: "ID1".into(),
            chat_id: if is_group {
                "120363001234567890@g.us".into()
            } else {
                sender.into()
            },
            sender_id: sender.into(),
            push_name: String::new(),
            is_group,
            from_me: false,
            body: String::new(),
            message_type: "conversation".into(),
            media: None,
            quoted: None,
            mentioned: vec![],
            is_bot: false,
            timestamp: Utc::now(),
        }
    }

    fn group() -> GroupMetadata {
        GroupMetadata {
            id: "120363001234567890@g.us".into(),
            subject: "Test".into(),
            owner: Some("111@s.whatsapp.net".into()),
            participants: vec![
                Participant {
                    id: "111@s.whatsapp.net".into(),
                    role: ParticipantRole::SuperAdmin,
                },
                Participant {
                    id: "222@s.whatsapp.net".into(),
                    role: ParticipantRole::Admin,
                },
                Participant {
                    id: "333@s.whatsapp.net".into(),
                    role: ParticipantRole::Member,
                },
                Participant {
                    id: "999@s.whatsapp.net".into(),
                    role: ParticipantRole::Admin,
                },
            ],
        }
    }

    #[test]
    fn test_premium_matches_after_digit_normalization() {
        let premium = vec!["6281234567890".to_string()];
        let msg = message("+62 812-3456-7890", false);
        let facts = classify(
            &msg,
            AllowLists {
                owners: &[],
                premium: &premium,
                known_users: &[],
            },
            None,
            None,
        );
        assert!(facts.is_premium);
        assert!(!facts.is_owner);
    }

    #[test]
    fn test_owner_is_premium() {
        let owners = vec!["62 812".to_string()];
        let msg = message("62812:4@s.whatsapp.net", false);
        let facts = classify(
            &msg,
            AllowLists {
                owners: &owners,
                premium: &[],
                known_users: &[],
            },
            None,
            None,
        );
        assert!(facts.is_owner);
        assert!(facts.is_premium);
    }

    #[test]
    fn test_group_roles() {
        let meta = group();
        let lists = AllowLists {
            owners: &[],
            premium: &[],
            known_users: &[],
        };

        let creator = classify(
            &message("111@s.whatsapp.net", true),
            lists,
            Some(&meta),
            Some("999:2@s.whatsapp.net"),
        );
        assert!(creator.is_group_admin);
        assert!(creator.is_group_creator);
        assert!(creator.is_bot_group_admin);

        let admin = classify(&message("222@s.whatsapp.net", true), lists, Some(&meta), None);
        assert!(admin.is_group_admin);
        assert!(!admin.is_group_creator);
        assert!(!admin.is_bot_group_admin);

        let member = classify(&message("333@s.whatsapp.net", true), lists, Some(&meta), None);
        assert!(!member.is_group_admin);
    }

    #[test]
    fn test_group_flags_require_group_chat() {
        let meta = group();
        let facts = classify(
            &message("222@s.whatsapp.net", false),
            AllowLists {
                owners: &[],
                premium: &[],
                known_users: &[],
            },
            Some(&meta),
            Some("999@s.whatsapp.net"),
        );
        assert!(!facts.is_group_admin);
        assert!(!facts.is_bot_group_admin);
    }

    #[test]
    fn test_known_user() {
        let known = vec!["6281234567890@s.whatsapp.net".to_string()];
        let facts = classify(
            &message("6281234567890@s.whatsapp.net", false),
            AllowLists {
                owners: &[],
                premium: &[],
                known_users: &known,
            },
            None,
            None,
        );
        assert!(facts.is_known_user);
    }

    #[test]
    fn test_satisfies() {
        let facts = PermissionFacts {
            is_owner: true,
            ..Default::default()
        };
        assert!(facts.satisfies(Role::Owner, false));
        assert!(!facts.satisfies(Role::GroupChat, false));
        assert!(facts.satisfies(Role::GroupChat, true));
        assert!(!facts.satisfies(Role::GroupAdmin, true));
    }
}
