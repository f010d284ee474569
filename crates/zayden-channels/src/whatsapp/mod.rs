//! WhatsApp channel: pure Rust implementation via `whatsapp-rust`.
//!
//! Uses the WhatsApp Web protocol (Noise handshake + Signal encryption).
//! Pairing is done by scanning a QR code, like WhatsApp Web.
//! Session is persisted to `{data_dir}/whatsapp_session/session.db`.

mod bot;
mod cache;
mod channel;
mod events;
mod groups;
mod qr;
mod send;

#[cfg(test)]
mod tests;

pub use qr::generate_qr_terminal;

use cache::MessageCache;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use whatsapp_rust::client::Client;
use zayden_core::{config::WhatsAppConfig, error::ZaydenError, group::GroupMetadata};

/// How many raw messages are kept for downloads and quoting.
const MESSAGE_CACHE_CAPACITY: usize = 512;

/// WhatsApp channel using the WhatsApp Web protocol.
pub struct WhatsAppChannel {
    pub(super) config: WhatsAppConfig,
    pub(super) session_path: PathBuf,
    /// Client handle for sending messages, set after `start()`.
    pub(super) client: Arc<Mutex<Option<Arc<Client>>>>,
    /// Message IDs we sent, used to ignore our own echo.
    pub(super) sent_ids: Arc<Mutex<HashSet<String>>>,
    /// Raw protocol messages by id, for media download and quoting.
    pub(super) messages: Arc<Mutex<MessageCache>>,
    /// Group metadata with the time it was fetched.
    pub(super) groups: Arc<Mutex<HashMap<String, (Instant, GroupMetadata)>>>,
    /// Sender for QR code events from the running bot.
    pub(super) qr_tx: Arc<Mutex<Option<mpsc::Sender<String>>>>,
    /// Last QR code data, buffered so `pairing_channel()` can replay it
    /// even if the QR event fired before anyone started listening.
    pub(super) last_qr: Arc<Mutex<Option<String>>>,
    pub(super) http: reqwest::Client,
}

impl WhatsAppChannel {
    /// Create a new WhatsApp channel from config.
    pub fn new(config: WhatsAppConfig, session_path: PathBuf) -> Self {
        Self {
            config,
            session_path,
            client: Arc::new(Mutex::new(None)),
            sent_ids: Arc::new(Mutex::new(HashSet::new())),
            messages: Arc::new(Mutex::new(MessageCache::new(MESSAGE_CACHE_CAPACITY))),
            groups: Arc::new(Mutex::new(HashMap::new())),
            qr_tx: Arc::new(Mutex::new(None)),
            last_qr: Arc::new(Mutex::new(None)),
            http: reqwest::Client::new(),
        }
    }

    /// Check if the WhatsApp client is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Receiver for QR codes to display while the device is unpaired.
    ///
    /// A QR code generated before this call is replayed immediately.
    pub async fn pairing_channel(&self) -> mpsc::Receiver<String> {
        let (qr_tx, qr_rx) = mpsc::channel::<String>(4);
        if let Some(ref qr) = *self.last_qr.lock().await {
            let _ = qr_tx.send(qr.clone()).await;
        }
        *self.qr_tx.lock().await = Some(qr_tx);
        qr_rx
    }

    /// Session database path; creates its directory.
    pub(super) fn session_db_path(&self) -> Result<String, ZaydenError> {
        if let Some(dir) = self.session_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                ZaydenError::Channel(format!("failed to create {}: {e}", dir.display()))
            })?;
        }
        Ok(self.session_path.to_string_lossy().into_owned())
    }

    /// Connected client, or a channel error.
    pub(super) async fn connected_client(&self) -> Result<Arc<Client>, ZaydenError> {
        self.client
            .lock()
            .await
            .clone()
            .ok_or_else(|| ZaydenError::Channel("whatsapp client not connected".into()))
    }
}
