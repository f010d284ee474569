use serde::{Deserialize, Serialize};

use super::defaults::{default_device_name, default_true};

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// WhatsApp channel config.
///
/// Session data is stored at `{data_dir}/whatsapp_session/`.
/// Pairing is done by scanning a QR code (like WhatsApp Web).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Device name shown under "Linked devices" on the phone.
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_name: default_device_name(),
        }
    }
}
