use crate::normalize::FormatMode;
use crate::types::ChannelFilter;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TRUNCATE_LENGTH: usize = 6000;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DISCORD_TOKEN is required")]
    MissingDiscordToken,
    #[error("WECHAT_WEBHOOK_URL is required")]
    MissingWebhookUrl,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord: DiscordConfig,
    pub wecom: WecomConfig,
    pub forward: ForwardConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WecomConfig {
    pub webhook_url: Option<String>,
    /// Empty disables signing.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    pub allowed_channel_ids: Vec<u64>,
    pub truncate_length: usize,
    pub max_image_bytes: usize,
    pub send_delay_seconds: f64,
    pub forward_images: bool,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            allowed_channel_ids: Vec::new(),
            truncate_length: DEFAULT_TRUNCATE_LENGTH,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            send_delay_seconds: 0.5,
            forward_images: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Webhook posts.
    pub request_seconds: u64,
    /// Attachment downloads.
    pub fetch_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_seconds: 8,
            fetch_seconds: 12,
        }
    }
}

impl Config {
    /// Startup check. Anything returned here should stop the process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(ConfigError::MissingDiscordToken);
        }
        if self
            .wecom
            .webhook_url
            .as_deref()
            .map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::MissingWebhookUrl);
        }
        if self.forward.truncate_length == 0 {
            return Err(ConfigError::InvalidSetting(
                "truncate_length must be positive".to_string(),
            ));
        }
        let delay = self.forward.send_delay_seconds;
        if let Err(err) = Duration::try_from_secs_f64(delay) {
            return Err(ConfigError::InvalidSetting(format!(
                "send_delay_seconds must be a non-negative number, got {}: {}",
                delay, err
            )));
        }
        if self.timeouts.request_seconds == 0 || self.timeouts.fetch_seconds == 0 {
            return Err(ConfigError::InvalidSetting(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn channel_filter(&self) -> ChannelFilter {
        ChannelFilter::new(self.forward.allowed_channel_ids.iter().copied())
    }

    pub fn format_mode(&self) -> FormatMode {
        if self.forward.forward_images {
            FormatMode::ImageAware
        } else {
            FormatMode::LinksOnly
        }
    }

    pub fn send_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.forward.send_delay_seconds).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_seconds)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.fetch_seconds)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn resolve_config_path() -> PathBuf {
    env::var("WECOM_BRIDGE_CONFIG")
        .ok()
        .map(PathBuf::from)
        .unwrap_or_else(|| expand_tilde("~/.wecom-bridge/config.json"))
}

/// Reads the optional JSON config file, then applies environment overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    let mut cfg = load_config_file(&resolve_config_path())?;
    apply_env_overrides(&mut cfg, |key| env::var(key).ok())?;
    Ok(cfg)
}

pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str::<Config>(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("DISCORD_TOKEN") {
        cfg.discord.token = Some(token);
    }
    if let Some(url) = get("WECHAT_WEBHOOK_URL") {
        cfg.wecom.webhook_url = Some(url);
    }
    if let Some(secret) = get("WECHAT_WEBHOOK_SECRET") {
        cfg.wecom.secret = secret;
    }
    if let Some(raw) = get("ALLOWED_CHANNEL_IDS") {
        cfg.forward.allowed_channel_ids = parse_channel_ids(&raw);
    }
    if let Some(raw) = get("TRUNCATE_LENGTH") {
        cfg.forward.truncate_length = parse_number("TRUNCATE_LENGTH", &raw)?;
    }
    if let Some(raw) = get("MAX_IMAGE_BYTES") {
        cfg.forward.max_image_bytes = parse_number("MAX_IMAGE_BYTES", &raw)?;
    }
    if let Some(raw) = get("SEND_DELAY_SECONDS") {
        cfg.forward.send_delay_seconds = parse_number("SEND_DELAY_SECONDS", &raw)?;
    }
    if let Some(raw) = get("FORWARD_IMAGES") {
        cfg.forward.forward_images = parse_flag("FORWARD_IMAGES", &raw)?;
    }
    if let Some(raw) = get("REQUEST_TIMEOUT") {
        cfg.timeouts.request_seconds = parse_number("REQUEST_TIMEOUT", &raw)?;
    }
    if let Some(raw) = get("FETCH_TIMEOUT") {
        cfg.timeouts.fetch_seconds = parse_number("FETCH_TIMEOUT", &raw)?;
    }
    Ok(())
}

/// Comma separated ids; entries that are not integers are skipped.
pub fn parse_channel_ids(raw: &str) -> Vec<u64> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<u64>() {
            Ok(id) => ids.push(id),
            Err(_) => warn!("ignoring invalid channel id: {part}"),
        }
    }
    ids
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
