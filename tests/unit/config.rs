use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use wecom_bridge::config::{
    apply_env_overrides, load_config_file, parse_channel_ids, Config, ConfigError,
    DEFAULT_MAX_IMAGE_BYTES, DEFAULT_TRUNCATE_LENGTH,
};
use wecom_bridge::normalize::FormatMode;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn apply(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars = env(pairs);
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg, |key| vars.get(key).cloned())?;
    Ok(cfg)
}

#[test]
fn test_default_config() {
    let cfg = Config::default();
    assert!(cfg.discord.token.is_none());
    assert!(cfg.wecom.webhook_url.is_none());
    assert!(cfg.wecom.secret.is_empty());
    assert!(cfg.forward.allowed_channel_ids.is_empty());
    assert_eq!(cfg.forward.truncate_length, 6000);
    assert_eq!(cfg.forward.max_image_bytes, 5_242_880);
    assert_eq!(cfg.forward.send_delay_seconds, 0.5);
    assert!(cfg.forward.forward_images);
    assert_eq!(cfg.timeouts.request_seconds, 8);
    assert_eq!(cfg.timeouts.fetch_seconds, 12);
    assert_eq!(DEFAULT_TRUNCATE_LENGTH, 6000);
    assert_eq!(DEFAULT_MAX_IMAGE_BYTES, 5 * 1024 * 1024);
}

#[test]
fn test_default_derived_values() {
    let cfg = Config::default();
    assert_eq!(cfg.send_delay(), Duration::from_millis(500));
    assert_eq!(cfg.request_timeout(), Duration::from_secs(8));
    assert_eq!(cfg.fetch_timeout(), Duration::from_secs(12));
    assert_eq!(cfg.format_mode(), FormatMode::ImageAware);
    assert!(cfg.channel_filter().is_empty());
}

#[test]
fn test_env_overrides() {
    let cfg = apply(&[
        ("DISCORD_TOKEN", "tok"),
        ("WECHAT_WEBHOOK_URL", "https://hook.example.com/send?key=k"),
        ("WECHAT_WEBHOOK_SECRET", "SEC"),
        ("ALLOWED_CHANNEL_IDS", "111, 222"),
        ("TRUNCATE_LENGTH", "100"),
        ("MAX_IMAGE_BYTES", "2048"),
        ("SEND_DELAY_SECONDS", "0.25"),
        ("FORWARD_IMAGES", "false"),
        ("REQUEST_TIMEOUT", "5"),
        ("FETCH_TIMEOUT", "20"),
    ])
    .unwrap();

    assert_eq!(cfg.discord.token.as_deref(), Some("tok"));
    assert_eq!(
        cfg.wecom.webhook_url.as_deref(),
        Some("https://hook.example.com/send?key=k")
    );
    assert_eq!(cfg.wecom.secret, "SEC");
    assert_eq!(cfg.forward.allowed_channel_ids, vec![111, 222]);
    assert_eq!(cfg.forward.truncate_length, 100);
    assert_eq!(cfg.forward.max_image_bytes, 2048);
    assert_eq!(cfg.send_delay(), Duration::from_millis(250));
    assert_eq!(cfg.format_mode(), FormatMode::LinksOnly);
    assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.fetch_timeout(), Duration::from_secs(20));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_blank_env_values_ignored() {
    let cfg = apply(&[("DISCORD_TOKEN", "  "), ("TRUNCATE_LENGTH", "")]).unwrap();
    assert!(cfg.discord.token.is_none());
    assert_eq!(cfg.forward.truncate_length, 6000);
}

#[test]
fn test_invalid_number_is_error() {
    let err = apply(&[("MAX_IMAGE_BYTES", "five megs")]).unwrap_err();
    match err {
        ConfigError::InvalidValue { key, value } => {
            assert_eq!(key, "MAX_IMAGE_BYTES");
            assert_eq!(value, "five megs");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parse_channel_ids_skips_invalid() {
    assert_eq!(parse_channel_ids("1,abc, 3,,"), vec![1, 3]);
    assert!(parse_channel_ids("  ").is_empty());
}

#[test]
fn test_validate_requires_token_and_url() {
    let cfg = Config::default();
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingDiscordToken)));

    let cfg = apply(&[("DISCORD_TOKEN", "tok")]).unwrap();
    assert!(matches!(cfg.validate(), Err(ConfigError::MissingWebhookUrl)));
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let mut cfg = apply(&[
        ("DISCORD_TOKEN", "tok"),
        ("WECHAT_WEBHOOK_URL", "https://hook.example.com/send?key=k"),
    ])
    .unwrap();
    cfg.timeouts.fetch_seconds = 0;
    assert!(matches!(cfg.validate(), Err(ConfigError::InvalidSetting(_))));
}

#[test]
fn test_load_config_file_partial() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"wecom": {{"webhook_url": "https://hook.example.com/send?key=f"}}, "forward": {{"allowed_channel_ids": [42]}}}}"#
    )
    .unwrap();

    let cfg = load_config_file(file.path()).unwrap();
    assert_eq!(
        cfg.wecom.webhook_url.as_deref(),
        Some("https://hook.example.com/send?key=f")
    );
    assert_eq!(cfg.forward.allowed_channel_ids, vec![42]);
    assert_eq!(cfg.forward.truncate_length, 6000);
    assert_eq!(cfg.timeouts.fetch_seconds, 12);
}

#[test]
fn test_load_config_file_missing_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_file(&dir.path().join("absent.json")).unwrap();
    assert!(cfg.wecom.webhook_url.is_none());
}

#[test]
fn test_load_config_file_malformed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(matches!(
        load_config_file(file.path()),
        Err(ConfigError::Parse { .. })
    ));
}
