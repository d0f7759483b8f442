pub mod channels;
pub mod config;
pub mod fetch;
pub mod forward;
pub mod normalize;
pub mod payload;
pub mod sign;
pub mod types;
pub mod wecom;

pub use config::Config;
pub use forward::Forwarder;

#[cfg(feature = "discord")]
use {
    self::types::InboundMessage,
    std::time::Duration,
    tokio::sync::mpsc,
    tracing::{info, warn},
};

#[cfg(feature = "discord")]
const QUEUE_CAPACITY: usize = 100;
#[cfg(feature = "discord")]
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Builds the forwarder with one shared HTTP client for webhook posts and
/// attachment downloads.
pub fn build_forwarder(config: &Config) -> anyhow::Result<Forwarder> {
    let http = reqwest::Client::builder().build()?;
    Ok(Forwarder::from_config(config, http)?)
}

/// Validates the config, then relays Discord messages until the gateway
/// connection ends or ctrl-c is received.
#[cfg(feature = "discord")]
pub async fn start(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let forwarder = build_forwarder(&config)?;
    let token = config.discord.token.clone().unwrap_or_default();

    info!(
        signed = !config.wecom.secret.is_empty(),
        allowed_channels = config.forward.allowed_channel_ids.len(),
        forward_images = config.forward.forward_images,
        "starting discord -> wecom bridge"
    );

    let (tx, rx) = mpsc::channel::<InboundMessage>(QUEUE_CAPACITY);
    let worker = tokio::spawn(forward::run_forward_worker(rx, forwarder));

    let outcome = tokio::select! {
        result = channels::discord::start_discord(&token, tx) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            Ok(())
        }
    };

    if tokio::time::timeout(SHUTDOWN_GRACE, worker).await.is_err() {
        warn!("in-flight messages did not finish before shutdown");
    }
    outcome
}
