//! Gateway: the main event loop connecting the channel to the command router.
//!
//! Every inbound envelope runs in its own task, spawned in arrival order.
//! A panicking handler is logged as fatal and never takes the loop down.

mod pipeline;

use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use zayden_core::{
    busy::BusyRegistry,
    config::Config,
    traits::{Channel, MediaConverter, Messenger, Scraper},
};
use zayden_store::Lists;

/// The central gateway that routes inbound messages to command handlers.
pub struct Gateway {
    pub(super) channel: Arc<dyn Channel>,
    pub(super) messenger: Arc<dyn Messenger>,
    pub(super) scraper: Arc<dyn Scraper>,
    pub(super) converter: Arc<dyn MediaConverter>,
    pub(super) config: Config,
    pub(super) lists: Lists,
    pub(super) busy: BusyRegistry,
    pub(super) uptime: Instant,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        channel: Arc<dyn Channel>,
        messenger: Arc<dyn Messenger>,
        scraper: Arc<dyn Scraper>,
        converter: Arc<dyn MediaConverter>,
        config: Config,
        lists: Lists,
    ) -> Self {
        Self {
            channel,
            messenger,
            scraper,
            converter,
            config,
            lists,
            busy: BusyRegistry::new(),
            uptime: Instant::now(),
        }
    }

    /// Run the main event loop until the channel closes or Ctrl-C.
    ///
    /// A closed channel lets in-flight handlers finish; Ctrl-C aborts them.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let mut rx = self
            .channel
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start channel {}: {e}", self.channel.name()))?;

        info!(
            "{} gateway running | channel: {} | prefix: '{}' | self mode: {}",
            self.config.bot.name,
            self.channel.name(),
            self.config.bot.prefix,
            if self.config.bot.self_mode { "on" } else { "off" },
        );

        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                envelope = rx.recv() => match envelope {
                    Some(envelope) => {
                        let gw = self.clone();
                        tasks.spawn(async move {
                            gw.handle_envelope(envelope).await;
                        });
                    }
                    None => {
                        warn!("channel {} closed its inbound stream", self.channel.name());
                        while let Some(joined) = tasks.join_next().await {
                            log_join(joined);
                        }
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(tasks).await;
        Ok(())
    }

    /// Abort in-flight handlers and stop the channel.
    async fn shutdown(&self, mut tasks: JoinSet<()>) {
        info!("Shutting down...");
        if !tasks.is_empty() {
            info!("aborting {} in-flight handler(s)", tasks.len());
        }
        tasks.shutdown().await;

        if let Err(e) = self.channel.stop().await {
            warn!("failed to stop channel {}: {e}", self.channel.name());
        }
        info!("Shutdown complete.");
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("Fatal: message handler panicked: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use zayden_core::{
        envelope::{Content, Envelope},
        error::ZaydenError,
        group::GroupMetadata,
        message::{Contact, MessageKey, OutgoingMedia, ParticipantAction},
        traits::StickerPack,
    };

    const BOT: &str = "6281300000000@s.whatsapp.net";
    const CURSED: &str = "6281200000001@s.whatsapp.net";
    const CALM: &str = "6281200000002@s.whatsapp.net";

    /// Yields a fixed batch of envelopes, then closes.
    struct ScriptedChannel {
        rx: Mutex<Option<mpsc::Receiver<Envelope>>>,
    }

    impl ScriptedChannel {
        fn new(envelopes: Vec<Envelope>) -> Self {
            let (tx, rx) = mpsc::channel(envelopes.len().max(1));
            for envelope in envelopes {
                tx.try_send(envelope).unwrap();
            }
            Self {
                rx: Mutex::new(Some(rx)),
            }
        }
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn start(&self) -> Result<mpsc::Receiver<Envelope>, ZaydenError> {
            self.rx
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| ZaydenError::Channel("already started".into()))
        }

        async fn stop(&self) -> Result<(), ZaydenError> {
            Ok(())
        }
    }

    /// Panics on any reply to `CURSED`, records the rest.
    #[derive(Default)]
    struct CursedMessenger {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl CursedMessenger {
        fn record(&self, chat: &str, text: &str) {
            if chat == CURSED {
                panic!("reply to {chat} blew up");
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat.to_string(), text.to_string()));
        }
    }

    #[async_trait]
    impl Messenger for CursedMessenger {
        async fn own_id(&self) -> Option<String> {
            Some(BOT.to_string())
        }

        async fn send_text(
            &self,
            chat: &str,
            text: &str,
            _quoted: Option<&MessageKey>,
        ) -> Result<(), ZaydenError> {
            self.record(chat, text);
            Ok(())
        }

        async fn send_mentions(
            &self,
            chat: &str,
            text: &str,
            _mentions: &[String],
        ) -> Result<(), ZaydenError> {
            self.record(chat, text);
            Ok(())
        }

        async fn send_media(
            &self,
            chat: &str,
            _media: OutgoingMedia,
            _quoted: Option<&MessageKey>,
        ) -> Result<(), ZaydenError> {
            self.record(chat, "<media>");
            Ok(())
        }

        async fn send_contacts(
            &self,
            chat: &str,
            _contacts: &[Contact],
            _quoted: Option<&MessageKey>,
        ) -> Result<(), ZaydenError> {
            self.record(chat, "<contacts>");
            Ok(())
        }

        async fn delete_message(&self, _key: &MessageKey) -> Result<(), ZaydenError> {
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

        async fn group_metadata(&self, _group: &str) -> Result<GroupMetadata, ZaydenError> {
            Err(ZaydenError::Channel("no groups".into()))
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

    fn command(id: &str, sender: &str, text: &str) -> Envelope {
        Envelope {
            id: id.into(),
            chat_id: sender.into(),
            sender_id: sender.into(),
            push_name: "Tester".into(),
            from_me: false,
            is_group: false,
            timestamp: chrono::Utc::now(),
            content: Some(Content::Conversation { text: text.into() }),
        }
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_stop_the_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let lists = Lists::open(tmp.path()).await.unwrap();
        let messenger = Arc::new(CursedMessenger::default());
        let channel = ScriptedChannel::new(vec![
            command("P1", CURSED, ".license"),
            command("P2", CALM, ".license"),
        ]);
        let gw = Arc::new(Gateway::new(
            Arc::new(channel),
            messenger.clone(),
            Arc::new(NoScraper),
            Arc::new(NoConverter),
            Config::default(),
            lists,
        ));

        gw.run().await.unwrap();

        let sent = messenger.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, CALM);
        assert!(sent[0].1.contains("MIT"));
    }
}
