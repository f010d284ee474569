use super::*;
use crate::permissions::Role;

#[test]
fn test_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.bot.prefix, ".");
    assert_eq!(cfg.bot.data_dir, "~/.zayden");
    assert!(!cfg.bot.self_mode);
    assert!(cfg.owner.numbers.is_empty());
    assert!(cfg.channel.whatsapp.enabled);
    assert_eq!(cfg.media.max_enhance_bytes, 500_000);
    assert_eq!(cfg.media.max_upload_bytes, 10_000_000);
    assert_eq!(cfg.services.timeout_secs, 60);
}

#[test]
fn test_partial_toml_fills_defaults() {
    let toml_str = r#"
        [bot]
        prefix = "!"
        self_mode = true

        [owner]
        numbers = ["+62 812-3456-7890"]

        [replies]
        busy = "Sabar dulu"
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.bot.prefix, "!");
    assert!(cfg.bot.self_mode);
    assert_eq!(cfg.bot.name, "Zayden");
    assert_eq!(cfg.owner.numbers, vec!["+62 812-3456-7890"]);
    assert_eq!(cfg.owner.name, "Owner");
    assert_eq!(cfg.replies.busy, "Sabar dulu");
    assert_eq!(cfg.replies.error, Replies::default().error);
    assert_eq!(cfg.media.ffmpeg_path, "ffmpeg");
}

#[test]
fn test_empty_toml_is_default() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.bot.prefix, ".");
    assert_eq!(cfg.channel.whatsapp.device_name, "Zayden");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/zayden/config.toml").unwrap();
    assert_eq!(cfg.bot.prefix, ".");
}

#[test]
fn test_load_invalid_toml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[bot\nprefix = ").unwrap();
    let err = load(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, ZaydenError::Config(_)));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[bot]\ndata_dir = \"/srv/zayden\"\n[services]\nbase_url = \"http://localhost:9000\"\n",
    )
    .unwrap();
    let cfg = load(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.lists_dir(), PathBuf::from("/srv/zayden/data"));
    assert_eq!(cfg.logs_dir(), PathBuf::from("/srv/zayden/logs"));
    assert_eq!(cfg.services.base_url, "http://localhost:9000");
}

#[test]
fn test_shellexpand() {
    assert_eq!(shellexpand("/abs/path"), "/abs/path");
    if let Some(home) = std::env::var_os("HOME") {
        assert_eq!(
            shellexpand("~/.zayden"),
            format!("{}/.zayden", home.to_string_lossy())
        );
    }
}

#[test]
fn test_denied_reply_per_role() {
    let r = Replies::default();
    assert_eq!(r.denied(Role::Owner), r.owner_only);
    assert_eq!(r.denied(Role::GroupChat), r.group_only);
    assert_eq!(r.denied(Role::BotGroupAdmin), r.bot_admin_only);
}
