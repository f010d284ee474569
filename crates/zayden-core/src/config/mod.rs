mod channels;
mod defaults;
mod replies;

#[cfg(test)]
mod tests;

pub use channels::*;
pub use replies::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ZaydenError;
use defaults::*;

/// Top-level Zayden configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub owner: OwnerConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub replies: Replies,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Command prefix. An empty prefix disables commands.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Only owners may talk to the bot.
    #[serde(default)]
    pub self_mode: bool,
    /// Sticker pack name embedded in generated stickers.
    #[serde(default = "default_pack_name")]
    pub pack_name: String,
    #[serde(default = "default_pack_author")]
    pub pack_author: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            prefix: default_prefix(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            self_mode: false,
            pack_name: default_pack_name(),
            pack_author: default_pack_author(),
        }
    }
}

/// Bot owners. Numbers in any format; compared by digits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerConfig {
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default = "default_owner_name")]
    pub name: String,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            numbers: Vec::new(),
            name: default_owner_name(),
        }
    }
}

/// Scraper service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Base URL of the scraper API.
    #[serde(default = "default_services_base_url")]
    pub base_url: String,
    /// Bearer token sent to the scraper API, if it wants one.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            base_url: default_services_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Media conversion and size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// ffmpeg subprocess timeout in seconds.
    #[serde(default = "default_convert_timeout_secs")]
    pub convert_timeout_secs: u64,
    /// Largest image accepted by the enhancer, in bytes.
    #[serde(default = "default_max_enhance_bytes")]
    pub max_enhance_bytes: u64,
    /// Largest file accepted by `tourl`, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Largest body returned by `get`, in bytes.
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            convert_timeout_secs: default_convert_timeout_secs(),
            max_enhance_bytes: default_max_enhance_bytes(),
            max_upload_bytes: default_max_upload_bytes(),
            max_fetch_bytes: default_max_fetch_bytes(),
        }
    }
}

impl Config {
    /// Data directory with `~` expanded.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand(&self.bot.data_dir))
    }

    /// Directory holding the persisted lists.
    pub fn lists_dir(&self) -> PathBuf {
        self.data_dir().join("data")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    /// WhatsApp session database.
    pub fn session_path(&self) -> PathBuf {
        self.data_dir().join("whatsapp_session").join("session.db")
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, ZaydenError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ZaydenError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| ZaydenError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
