use thiserror::Error;

/// Top-level error type for Zayden.
#[derive(Debug, Error)]
pub enum ZaydenError {
    /// Envelope carried no interpretable content.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Error from the messaging channel (transport, send, moderation).
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Persisted list storage error.
    #[error("store error: {0}")]
    Store(String),

    /// Error from an external scraper or downloader service.
    #[error("service error: {0}")]
    Service(String),

    /// Media conversion error.
    #[error("media error: {0}")]
    Media(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
