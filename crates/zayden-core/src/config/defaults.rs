pub(super) fn default_name() -> String {
    "Zayden".to_string()
}
pub(super) fn default_prefix() -> String {
    ".".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.zayden".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_pack_name() -> String {
    "Zayden".to_string()
}
pub(super) fn default_pack_author() -> String {
    "zayden-bot".to_string()
}
pub(super) fn default_owner_name() -> String {
    "Owner".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_device_name() -> String {
    "Zayden".to_string()
}
pub(super) fn default_services_base_url() -> String {
    "https://aemt.me".to_string()
}
pub(super) fn default_timeout_secs() -> u64 {
    60
}
pub(super) fn default_user_agent() -> String {
    concat!("zayden/", env!("CARGO_PKG_VERSION")).to_string()
}
pub(super) fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}
pub(super) fn default_convert_timeout_secs() -> u64 {
    120
}
pub(super) fn default_max_enhance_bytes() -> u64 {
    500_000
}
pub(super) fn default_max_upload_bytes() -> u64 {
    10_000_000
}
pub(super) fn default_max_fetch_bytes() -> u64 {
    1_000_000
}
