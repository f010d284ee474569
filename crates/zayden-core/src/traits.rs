use crate::{
    envelope::Envelope,
    error::ZaydenError,
    group::GroupMetadata,
    message::{Contact, ListMenu, MessageKey, OutgoingMedia, ParticipantAction},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Messaging channel lifecycle, the inbound side.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening. Returns a receiver that yields raw envelopes.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<Envelope>, ZaydenError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), ZaydenError>;
}

/// Reply emitter and moderation surface of a channel.
///
/// Handlers decide *what* to send; implementations decide how it travels.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// JID of the bot account, once known.
    async fn own_id(&self) -> Option<String>;

    /// Send text, optionally quoting a message.
    async fn send_text(
        &self,
        chat: &str,
        text: &str,
        quoted: Option<&MessageKey>,
    ) -> Result<(), ZaydenError>;

    /// Send text that mentions `mentions` without listing them visibly.
    async fn send_mentions(
        &self,
        chat: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), ZaydenError>;

    async fn send_media(
        &self,
        chat: &str,
        media: OutgoingMedia,
        quoted: Option<&MessageKey>,
    ) -> Result<(), ZaydenError>;

    async fn send_contacts(
        &self,
        chat: &str,
        contacts: &[Contact],
        quoted: Option<&MessageKey>,
    ) -> Result<(), ZaydenError>;

    /// Send a choice menu. Defaults to a numbered text rendering.
    async fn send_list(
        &self,
        chat: &str,
        menu: &ListMenu,
        quoted: Option<&MessageKey>,
    ) -> Result<(), ZaydenError> {
        self.send_text(chat, &menu.render_text(), quoted).await
    }

    /// Delete (revoke) a message for everyone.
    async fn delete_message(&self, key: &MessageKey) -> Result<(), ZaydenError>;

    async fn update_participants(
        &self,
        group: &str,
        users: &[String],
        action: ParticipantAction,
    ) -> Result<(), ZaydenError>;

    async fn group_metadata(&self, group: &str) -> Result<GroupMetadata, ZaydenError>;

    /// Download the media of a message seen earlier (current or quoted).
    async fn download_media(&self, message_id: &str) -> Result<Vec<u8>, ZaydenError>;

    /// Debug dump of a message seen earlier, if the channel still holds it.
    async fn describe_message(&self, _message_id: &str) -> Option<String> {
        None
    }
}

/// A downloadable file reported by a scraper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable size, as reported by the service.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// One search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
}

/// TikTok post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TiktokPost {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// YouTube video details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Response of a plain HTTP fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fetched {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YoutubeFormat {
    Audio,
    Video,
}

/// External scraper and downloader services.
///
/// Every method defaults to "unsupported" so an implementation only covers
/// the services it actually reaches.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn shorten_url(&self, _url: &str) -> Result<String, ZaydenError> {
        Err(unsupported("shorten_url"))
    }

    /// Plain GET; `max_bytes` caps the body.
    async fn fetch(&self, _url: &str, _max_bytes: u64) -> Result<Fetched, ZaydenError> {
        Err(unsupported("fetch"))
    }

    async fn chat(&self, _prompt: &str) -> Result<String, ZaydenError> {
        Err(unsupported("chat"))
    }

    async fn enhance_image(&self, _image: Vec<u8>) -> Result<Vec<u8>, ZaydenError> {
        Err(unsupported("enhance_image"))
    }

    /// `None` when the track could not be identified.
    async fn identify_music(&self, _audio: Vec<u8>) -> Result<Option<String>, ZaydenError> {
        Err(unsupported("identify_music"))
    }

    /// Host a file and return its public URL.
    async fn upload(&self, _data: Vec<u8>, _mimetype: &str) -> Result<String, ZaydenError> {
        Err(unsupported("upload"))
    }

    async fn pinterest(&self, _query: &str) -> Result<Vec<String>, ZaydenError> {
        Err(unsupported("pinterest"))
    }

    async fn instagram(&self, _url: &str) -> Result<Vec<String>, ZaydenError> {
        Err(unsupported("instagram"))
    }

    async fn instagram_stories(&self, _username: &str) -> Result<Vec<String>, ZaydenError> {
        Err(unsupported("instagram_stories"))
    }

    async fn mediafire(&self, _url: &str) -> Result<RemoteFile, ZaydenError> {
        Err(unsupported("mediafire"))
    }

    async fn tiktok(&self, _url: &str) -> Result<TiktokPost, ZaydenError> {
        Err(unsupported("tiktok"))
    }

    async fn spotify_search(&self, _query: &str) -> Result<Vec<SearchHit>, ZaydenError> {
        Err(unsupported("spotify_search"))
    }

    async fn spotify_download(&self, _url: &str) -> Result<RemoteFile, ZaydenError> {
        Err(unsupported("spotify_download"))
    }

    async fn youtube_search(&self, _query: &str) -> Result<Vec<SearchHit>, ZaydenError> {
        Err(unsupported("youtube_search"))
    }

    async fn youtube_info(&self, _url: &str) -> Result<VideoInfo, ZaydenError> {
        Err(unsupported("youtube_info"))
    }

    async fn youtube_download(
        &self,
        _url: &str,
        _format: YoutubeFormat,
    ) -> Result<RemoteFile, ZaydenError> {
        Err(unsupported("youtube_download"))
    }

    /// Render a chat-bubble quote image (PNG).
    async fn quote_image(
        &self,
        _text: &str,
        _name: &str,
        _avatar_url: Option<&str>,
    ) -> Result<Vec<u8>, ZaydenError> {
        Err(unsupported("quote_image"))
    }

    /// Render text as an image; `style` is `"ttp"` or `"attp"`.
    async fn text_image(&self, _style: &str, _text: &str) -> Result<Vec<u8>, ZaydenError> {
        Err(unsupported("text_image"))
    }

    async fn khodam(&self, _name: &str) -> Result<String, ZaydenError> {
        Err(unsupported("khodam"))
    }
}

fn unsupported(op: &str) -> ZaydenError {
    ZaydenError::Service(format!("{op} is not supported by this scraper"))
}

/// Sticker pack metadata embedded in sticker files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickerPack {
    pub name: String,
    pub publisher: String,
}

/// Media transcoding.
#[async_trait]
pub trait MediaConverter: Send + Sync {
    /// Image or short video → WebP sticker tagged with `pack`.
    async fn to_sticker(
        &self,
        data: Vec<u8>,
        mimetype: &str,
        pack: &StickerPack,
    ) -> Result<Vec<u8>, ZaydenError>;

    /// Any audio/video → MP3.
    async fn to_audio(&self, data: Vec<u8>) -> Result<Vec<u8>, ZaydenError>;

    /// Sticker → PNG.
    async fn to_image(&self, data: Vec<u8>) -> Result<Vec<u8>, ZaydenError>;
}
