//! Bot lifecycle: building and running the WhatsApp bot.

use super::events::handle_whatsapp_message;
use super::WhatsAppChannel;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;
use zayden_core::{envelope::Envelope, error::ZaydenError};

impl WhatsAppChannel {
    /// Build a WhatsApp bot with the event handler and run it in the background.
    pub(super) async fn build_and_run_bot(
        &self,
        tx: mpsc::Sender<Envelope>,
    ) -> Result<(), ZaydenError> {
        let db_path = self.session_db_path()?;
        let client_handle = self.client.clone();

        info!("WhatsApp bot building (session: {db_path})...");

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| ZaydenError::Channel(format!("whatsapp store init failed: {e}")))?,
        );

        let tx_events = tx;
        let client_for_event = client_handle.clone();
        let sent_ids_for_event = self.sent_ids.clone();
        let messages_for_event = self.messages.clone();
        let groups_for_event = self.groups.clone();
        let qr_tx_handle = self.qr_tx.clone();
        let last_qr_handle = self.last_qr.clone();

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some(self.config.device_name.clone()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, client| {
                let tx = tx_events.clone();
                let client_store = client_for_event.clone();
                let sent_ids = sent_ids_for_event.clone();
                let messages = messages_for_event.clone();
                let groups = groups_for_event.clone();
                let qr_fwd = qr_tx_handle.clone();
                let last_qr_buf = last_qr_handle.clone();
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            info!("WhatsApp QR code generated (scan to pair)");
                            debug!("QR data: {code}");
                            *last_qr_buf.lock().await = Some(code.clone());
                            if let Some(sender) = qr_fwd.lock().await.as_ref() {
                                let _ = sender.send(code).await;
                            }
                        }
                        Event::PairSuccess(_) => {
                            info!("WhatsApp pairing successful!");
                        }
                        Event::Connected(_) => {
                            info!("WhatsApp connected");
                            *client_store.lock().await = Some(client);
                            *last_qr_buf.lock().await = None;
                        }
                        Event::Disconnected(_) => {
                            warn!("WhatsApp disconnected");
                            *client_store.lock().await = None;
                            groups.lock().await.clear();
                        }
                        Event::LoggedOut(_) => {
                            warn!("WhatsApp logged out, session invalidated");
                            *client_store.lock().await = None;
                        }
                        Event::Message(msg, info) => {
                            handle_whatsapp_message(*msg, info, &tx, &sent_ids, &messages).await;
                        }
                        _ => {}
                    }
                }
            })
            .build()
            .await
            .map_err(|e| ZaydenError::Channel(format!("whatsapp bot build failed: {e}")))?;

        // Store client reference immediately if already connected.
        *client_handle.lock().await = Some(bot.client());

        let _handle = bot
            .run()
            .await
            .map_err(|e| ZaydenError::Channel(format!("whatsapp bot run failed: {e}")))?;

        info!("WhatsApp bot started");
        Ok(())
    }
}
