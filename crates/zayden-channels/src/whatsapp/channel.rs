//! Channel and Messenger trait implementations for WhatsApp.

use super::groups;
use super::send::{
    contacts_message, default_mimetype, media_message, media_type, mention_context, parse_jid,
    quote_context, retry_send, revoke_message, split_message, text_message, MediaParts,
    UploadedMedia, MAX_TEXT_LEN,
};
use super::WhatsAppChannel;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};
use waproto::whatsapp as wa;
use zayden_core::{
    envelope::Envelope,
    error::ZaydenError,
    group::GroupMetadata,
    message::{Contact, MediaSource, MessageKey, OutgoingMedia, ParticipantAction},
    traits::{Channel, Messenger},
};

/// How long fetched group metadata stays valid.
const GROUP_CACHE_TTL: Duration = Duration::from_secs(60);

impl WhatsAppChannel {
    /// Send one protocol message and remember its id to skip the echo.
    async fn deliver(&self, chat: &str, msg: wa::Message) -> Result<(), ZaydenError> {
        let client = self.connected_client().await?;
        let jid = parse_jid(chat)?;
        let msg_id = retry_send(&client, &jid, msg).await?;
        self.sent_ids.lock().await.insert(msg_id);
        Ok(())
    }

    /// Reply context for `quoted`, attaching the cached body when available.
    async fn reply_context(&self, quoted: Option<&MessageKey>) -> Option<wa::ContextInfo> {
        let key = quoted?;
        let body = self.messages.lock().await.get(&key.id).cloned();
        Some(quote_context(key, body))
    }

    /// Resolve a media source to bytes plus a mimetype hint.
    async fn media_bytes(
        &self,
        source: MediaSource,
    ) -> Result<(Vec<u8>, Option<String>), ZaydenError> {
        match source {
            MediaSource::Bytes(data) => Ok((data, None)),
            MediaSource::Url(url) => {
                debug!("fetching outgoing media from {url}");
                let resp = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| ZaydenError::Channel(format!("media fetch {url} failed: {e}")))?;
                let mimetype = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
                let body = resp
                    .bytes()
                    .await
                    .map_err(|e| ZaydenError::Channel(format!("media fetch {url} failed: {e}")))?;
                Ok((body.to_vec(), mimetype))
            }
        }
    }
}

/// File name hint for a document sent from a URL.
fn file_name_of(source: &MediaSource) -> Option<String> {
    match source {
        MediaSource::Url(url) => url
            .split('?')
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        MediaSource::Bytes(_) => None,
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(&self) -> Result<mpsc::Receiver<Envelope>, ZaydenError> {
        if !self.config.enabled {
            return Err(ZaydenError::Config("whatsapp channel is disabled".into()));
        }
        let (tx, rx) = mpsc::channel(64);
        self.build_and_run_bot(tx).await?;
        info!("WhatsApp channel started");
        Ok(rx)
    }

    async fn stop(&self) -> Result<(), ZaydenError> {
        info!("WhatsApp channel stopped");
        *self.client.lock().await = None;
        Ok(())
    }
}

#[async_trait]
impl Messenger for WhatsAppChannel {
    async fn own_id(&self) -> Option<String> {
        let client = self.client.lock().await.clone()?;
        groups::own_jid(&client).await
    }

    async fn send_text(
        &self,
        chat: &str,
        text: &str,
        quoted: Option<&MessageKey>,
    ) -> Result<(), ZaydenError> {
        let mut context = self.reply_context(quoted).await;
        for chunk in split_message(text, MAX_TEXT_LEN) {
            // Only the first chunk quotes.
            self.deliver(chat, text_message(chunk, context.take())).await?;
        }
        Ok(())
    }

    async fn send_mentions(
        &self,
        chat: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), ZaydenError> {
        let msg = text_message(text, Some(mention_context(mentions)));
        self.deliver(chat, msg).await
    }

    async fn send_media(
        &self,
        chat: &str,
        media: OutgoingMedia,
        quoted: Option<&MessageKey>,
    ) -> Result<(), ZaydenError> {
        let file_name = file_name_of(&media.source);
        let (data, fetched_mimetype) = self.media_bytes(media.source).await?;
        let mimetype = media
            .mimetype
            .or(fetched_mimetype)
            .unwrap_or_else(|| default_mimetype(media.kind).to_string());

        let client = self.connected_client().await?;
        debug!("uploading {:?} ({} bytes, {mimetype})", media.kind, data.len());
        let upload = client
            .upload(data, media_type(media.kind))
            .await
            .map_err(|e| ZaydenError::Channel(format!("whatsapp media upload failed: {e}")))?;

        let parts = MediaParts {
            kind: media.kind,
            mimetype,
            caption: media.caption,
            view_once: media.view_once,
            file_name,
            context: self.reply_context(quoted).await,
        };
        let uploaded = UploadedMedia {
            url: upload.url,
            direct_path: upload.direct_path,
            media_key: upload.media_key,
            file_enc_sha256: upload.file_enc_sha256,
            file_sha256: upload.file_sha256,
            file_length: upload.file_length,
        };
        self.deliver(chat, media_message(parts, uploaded)).await
    }

    async fn send_contacts(
        &self,
        chat: &str,
        contacts: &[Contact],
        quoted: Option<&MessageKey>,
    ) -> Result<(), ZaydenError> {
        if contacts.is_empty() {
            return Ok(());
        }
        let context = self.reply_context(quoted).await;
        self.deliver(chat, contacts_message(contacts, context)).await
    }

    async fn delete_message(&self, key: &MessageKey) -> Result<(), ZaydenError> {
        self.deliver(&key.chat_id, revoke_message(key)).await
    }

    async fn update_participants(
        &self,
        group: &str,
        users: &[String],
        action: ParticipantAction,
    ) -> Result<(), ZaydenError> {
        let client = self.connected_client().await?;
        groups::update_participants(&client, group, users, action).await?;
        self.groups.lock().await.remove(group);
        Ok(())
    }

    async fn group_metadata(&self, group: &str) -> Result<GroupMetadata, ZaydenError> {
        if let Some((fetched_at, meta)) = self.groups.lock().await.get(group) {
            if fetched_at.elapsed() < GROUP_CACHE_TTL {
                return Ok(meta.clone());
            }
        }
        let client = self.connected_client().await?;
        let meta = groups::fetch_metadata(&client, group).await?;
        self.groups
            .lock()
            .await
            .insert(group.to_string(), (Instant::now(), meta.clone()));
        Ok(meta)
    }

    async fn download_media(&self, message_id: &str) -> Result<Vec<u8>, ZaydenError> {
        let msg = self
            .messages
            .lock()
            .await
            .get(message_id)
            .cloned()
            .ok_or_else(|| ZaydenError::Channel(format!("message {message_id} not cached")))?;
        let client = self.connected_client().await?;

        let result = if let Some(ref img) = msg.image_message {
            client.download(img.as_ref()).await
        } else if let Some(ref video) = msg.video_message {
            client.download(video.as_ref()).await
        } else if let Some(ref audio) = msg.audio_message {
            client.download(audio.as_ref()).await
        } else if let Some(ref sticker) = msg.sticker_message {
            client.download(sticker.as_ref()).await
        } else if let Some(ref doc) = msg.document_message {
            client.download(doc.as_ref()).await
        } else {
            return Err(ZaydenError::Channel(format!(
                "message {message_id} carries no media"
            )));
        };

        result.map_err(|e| ZaydenError::Channel(format!("whatsapp media download failed: {e}")))
    }

    async fn describe_message(&self, message_id: &str) -> Option<String> {
        self.messages
            .lock()
            .await
            .get(message_id)
            .map(|m| format!("{m:#?}"))
    }
}
