//! Message processing pipeline: the per-envelope dispatch flow.

use super::Gateway;
use crate::commands::{self, Command, CommandContext};
use zayden_core::{
    command,
    envelope::Envelope,
    message::CanonicalMessage,
    normalize::normalize,
    permissions::{classify, AllowLists, PermissionFacts},
};
use tracing::{debug, info, warn};

/// Chat id of WhatsApp status updates.
const STATUS_BROADCAST: &str = "status@broadcast";

/// Substrings that mark a WhatsApp group invite or chat link.
const GROUP_LINK_MARKERS: [&str; 3] = ["whatsapp.com", "wa.me", "chat.whatsapp"];

pub(super) fn contains_group_link(body: &str) -> bool {
    GROUP_LINK_MARKERS.iter().any(|m| body.contains(m))
}

fn preview(msg: &CanonicalMessage) -> String {
    if msg.body.is_empty() {
        return msg.message_type.clone();
    }
    if msg.body.chars().count() > 60 {
        let truncated: String = msg.body.chars().take(60).collect();
        format!("{truncated}...")
    } else {
        msg.body.clone()
    }
}

impl Gateway {
    /// Process a single inbound envelope through the full pipeline.
    pub(super) async fn handle_envelope(&self, envelope: Envelope) {
        let msg = match normalize(&envelope) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("dropping envelope {}: {e}", envelope.id);
                return;
            }
        };
        if msg.chat_id == STATUS_BROADCAST {
            return;
        }

        // --- 1. PERMISSION FACTS ---
        let own_id = self.messenger.own_id().await;
        let group = if msg.is_group {
            match self.messenger.group_metadata(&msg.chat_id).await {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!("group metadata for {} unavailable: {e}", msg.chat_id);
                    None
                }
            }
        } else {
            None
        };
        let premium = self.lists.premium.list().await;
        let users = self.lists.users.list().await;
        let facts = classify(
            &msg,
            AllowLists {
                owners: &self.config.owner.numbers,
                premium: &premium,
                known_users: &users,
            },
            group.as_ref(),
            own_id.as_deref(),
        );

        // --- 2. SELF MODE ---
        if self.config.bot.self_mode && !facts.is_owner {
            debug!("self mode: ignoring {}", msg.sender_id);
            return;
        }

        // --- 3. ANTI-LINK ---
        self.enforce_antilink(&msg, &facts).await;

        if msg.is_bot {
            debug!("ignoring bot message {}", msg.id);
            return;
        }

        // --- 4. KNOWN USERS ---
        if !facts.is_known_user {
            if let Err(e) = self.lists.users.add(&msg.sender_id).await {
                warn!("failed to record user {}: {e}", msg.sender_id);
            }
        }

        info!(
            "{} => {} | {} | {}",
            msg.push_name,
            msg.sender_id,
            if msg.is_group { "Group" } else { "Private" },
            preview(&msg)
        );

        // --- 5. ROUTING ---
        let parsed = command::parse(&msg.body, &self.config.bot.prefix);
        if !parsed.is_command {
            return;
        }
        let Some(cmd) = Command::from_token(&parsed.command) else {
            debug!("unknown command '{}' from {}", parsed.command, msg.sender_id);
            return;
        };

        let ctx = CommandContext {
            msg: &msg,
            parsed: &parsed,
            facts,
            group: group.as_ref(),
            own_id: own_id.as_deref(),
            config: &self.config,
            lists: &self.lists,
            messenger: self.messenger.as_ref(),
            scraper: self.scraper.as_ref(),
            converter: self.converter.as_ref(),
            busy: &self.busy,
            uptime: &self.uptime,
        };
        commands::execute(cmd, &ctx).await;
    }

    /// Delete group links posted by non-admins in anti-link groups.
    async fn enforce_antilink(&self, msg: &CanonicalMessage, facts: &PermissionFacts) {
        if !msg.is_group || !contains_group_link(&msg.body) {
            return;
        }
        if !self.lists.antilink.contains(&msg.chat_id).await {
            return;
        }
        if facts.is_group_admin || facts.is_group_creator {
            return;
        }
        info!("anti-link: deleting {} from {} in {}", msg.id, msg.sender_id, msg.chat_id);
        if let Err(e) = self.messenger.delete_message(&msg.key()).await {
            warn!("anti-link delete in {} failed: {e}", msg.chat_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};
    use zayden_core::{
        config::Config,
        envelope::Content,
        error::ZaydenError,
        group::{GroupMetadata, Participant, ParticipantRole},
        message::{Contact, MessageKey, OutgoingMedia, ParticipantAction},
        traits::{Channel, MediaConverter, Messenger, Scraper, StickerPack},
    };
    use zayden_store::Lists;

    const OWNER: &str = "6281100000000@s.whatsapp.net";
    const ADMIN: &str = "6281400000000@s.whatsapp.net";
    const MEMBER: &str = "6281200000000@s.whatsapp.net";
    const BOT: &str = "6281300000000@s.whatsapp.net";
    const GROUP: &str = "120363001234567890@g.us";

    struct IdleChannel;

    #[async_trait]
    impl Channel for IdleChannel {
        fn name(&self) -> &str {
            "test"
        }

        async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<Envelope>, ZaydenError> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        }

        async fn stop(&self) -> Result<(), ZaydenError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingMessenger {
        texts: Mutex<Vec<String>>,
        deleted: Mutex<Vec<MessageKey>>,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn own_id(&self) -> Option<String> {
            Some(BOT.to_string())
        }

        async fn send_text(
            &self,
            _chat: &str,
            text: &str,
            _quoted: Option<&MessageKey>,
        ) -> Result<(), ZaydenError> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn send_mentions(
            &self,
            _chat: &str,
            text: &str,
            _mentions: &[String],
        ) -> Result<(), ZaydenError> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn send_media(
            &self,
            _chat: &str,
            _media: OutgoingMedia,
            _quoted: Option<&MessageKey>,
        ) -> Result<(), ZaydenError> {
            Ok(())
        }

        async fn send_contacts(
            &self,
            _chat: &str,
            _contacts: &[Contact],
            _quoted: Option<&MessageKey>,
        ) -> Result<(), ZaydenError> {
            Ok(())
        }

        async fn delete_message(&self, key: &MessageKey) -> Result<(), ZaydenError> {
            self.deleted.lock().unwrap().push(key.clone());
            Ok(())
        }

        async fn update_participants(
            &self,
            _group: &str,
            _users: &[String],
            _action: ParticipantAction,
        ) -> Result<(), ZaydenError> {
            Ok(())
        }

        async fn group_metadata(&self, group: &str) -> Result<GroupMetadata, ZaydenError> {
            let member = |id: &str, role| Participant {
                id: id.into(),
                role,
            };
            Ok(GroupMetadata {
                id: group.into(),
                subject: "Test".into(),
                owner: Some(OWNER.into()),
                participants: vec![
                    member(OWNER, ParticipantRole::SuperAdmin),
                    member(ADMIN, ParticipantRole::Admin),
                    member(MEMBER, ParticipantRole::Member),
                    member(BOT, ParticipantRole::Admin),
                ],
            })
        }

        async fn download_media(&self, _message_id: &str) -> Result<Vec<u8>, ZaydenError> {
            Err(ZaydenError::Channel("no media".into()))
        }
    }

    struct NoScraper;
    impl Scraper for NoScraper {}

    struct NoConverter;

    #[async_trait]
    impl MediaConverter for NoConverter {
        async fn to_sticker(
            &self,
            _data: Vec<u8>,
            _mimetype: &str,
            _pack: &StickerPack,
        ) -> Result<Vec<u8>, ZaydenError> {
            Err(ZaydenError::Media("unused".into()))
        }

        async fn to_audio(&self, _data: Vec<u8>) -> Result<Vec<u8>, ZaydenError> {
            Err(ZaydenError::Media("unused".into()))
        }

        async fn to_image(&self, _data: Vec<u8>) -> Result<Vec<u8>, ZaydenError> {
            Err(ZaydenError::Media("unused".into()))
        }
    }

    async fn gateway(config: Config) -> (Gateway, Arc<RecordingMessenger>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let lists = Lists::open(tmp.path()).await.unwrap();
        let messenger = Arc::new(RecordingMessenger::default());
        let gw = Gateway::new(
            Arc::new(IdleChannel),
            messenger.clone(),
            Arc::new(NoScraper),
            Arc::new(NoConverter),
            config,
            lists,
        );
        (gw, messenger, tmp)
    }

    fn owner_config() -> Config {
        let mut config = Config::default();
        config.owner.numbers = vec![OWNER.split('@').next().unwrap().to_string()];
        config
    }

    fn envelope(id: &str, sender: &str, text: &str, in_group: bool) -> Envelope {
        Envelope {
            id: id.into(),
            chat_id: if in_group { GROUP.into() } else { sender.into() },
            sender_id: sender.into(),
            push_name: "Tester".into(),
            from_me: false,
            is_group: in_group,
            timestamp: Utc::now(),
            content: Some(Content::Conversation { text: text.into() }),
        }
    }

    #[test]
    fn test_contains_group_link() {
        assert!(contains_group_link("join https://chat.whatsapp.com/AbC"));
        assert!(contains_group_link("wa.me/6281234"));
        assert!(contains_group_link("https://whatsapp.com/channel/x"));
        assert!(!contains_group_link("https://example.com"));
        assert!(!contains_group_link(""));
    }

    #[tokio::test]
    async fn test_antilink_deletes_member_link() {
        let (gw, messenger, _tmp) = gateway(owner_config()).await;
        gw.lists.antilink.add(GROUP).await.unwrap();

        gw.handle_envelope(envelope("M1", MEMBER, "join chat.whatsapp.com/xyz", true))
            .await;
        let deleted = messenger.deleted.lock().unwrap().clone();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id, "M1");
        assert_eq!(deleted[0].sender_id, MEMBER);
    }

    #[tokio::test]
    async fn test_antilink_exempts_admin_and_creator() {
        let (gw, messenger, _tmp) = gateway(owner_config()).await;
        gw.lists.antilink.add(GROUP).await.unwrap();

        gw.handle_envelope(envelope("A1", ADMIN, "wa.me/628", true)).await;
        gw.handle_envelope(envelope("O1", OWNER, "wa.me/628", true)).await;
        assert!(messenger.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_antilink_off_leaves_links() {
        let (gw, messenger, _tmp) = gateway(owner_config()).await;
        gw.handle_envelope(envelope("M2", MEMBER, "wa.me/628", true)).await;
        assert!(messenger.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bot_message_dropped_after_antilink() {
        let (gw, messenger, _tmp) = gateway(owner_config()).await;
        gw.lists.antilink.add(GROUP).await.unwrap();

        gw.handle_envelope(envelope("BAE5ABCDEF123456", MEMBER, "wa.me/1", true))
            .await;
        assert_eq!(messenger.deleted.lock().unwrap().len(), 1);
        assert!(gw.lists.users.is_empty().await);

        gw.handle_envelope(envelope("BAE5ABCDEF654321", MEMBER, ".ping", false))
            .await;
        assert!(messenger.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_sender_recorded_once() {
        let (gw, _messenger, _tmp) = gateway(owner_config()).await;
        gw.handle_envelope(envelope("U1", MEMBER, "hello", false)).await;
        gw.handle_envelope(envelope("U2", MEMBER, "hello again", false)).await;
        assert_eq!(gw.lists.users.list().await, vec![MEMBER.to_string()]);
    }

    #[tokio::test]
    async fn test_status_updates_ignored() {
        let (gw, messenger, _tmp) = gateway(owner_config()).await;
        let mut status = envelope("S1", MEMBER, ".ping", false);
        status.chat_id = STATUS_BROADCAST.into();

        gw.handle_envelope(status).await;
        assert!(messenger.texts.lock().unwrap().is_empty());
        assert!(gw.lists.users.is_empty().await);
    }

    #[tokio::test]
    async fn test_self_mode_ignores_non_owner() {
        let mut config = owner_config();
        config.bot.self_mode = true;
        let (gw, messenger, _tmp) = gateway(config).await;

        gw.handle_envelope(envelope("S1", MEMBER, ".license", false)).await;
        assert!(messenger.texts.lock().unwrap().is_empty());
        assert!(gw.lists.users.is_empty().await);

        gw.handle_envelope(envelope("S2", OWNER, ".license", false)).await;
        assert_eq!(messenger.texts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_uppercase_command_routed() {
        let (gw, messenger, _tmp) = gateway(owner_config()).await;
        gw.handle_envelope(envelope("P1", MEMBER, ".LICENSE", false)).await;
        assert_eq!(messenger.texts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_envelope_dropped() {
        let (gw, messenger, _tmp) = gateway(owner_config()).await;
        let mut env = envelope("E1", MEMBER, "", false);
        env.content = None;
        gw.handle_envelope(env).await;
        assert!(gw.lists.users.is_empty().await);
        assert!(messenger.texts.lock().unwrap().is_empty());
    }
}
