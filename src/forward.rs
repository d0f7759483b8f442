use crate::config::{Config, ConfigError};
use crate::fetch::fetch_attachment;
use crate::normalize::{fallback_text, normalize, FormatMode};
use crate::payload::ImagePayload;
use crate::types::{Attachment, ChannelFilter, InboundMessage};
use crate::wecom::WecomClient;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Read-only settings shared by every unit of work.
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    pub filter: ChannelFilter,
    pub mode: FormatMode,
    pub max_text_len: usize,
    pub max_image_bytes: usize,
    pub send_delay: Duration,
    pub fetch_timeout: Duration,
}

impl ForwardSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            filter: cfg.channel_filter(),
            mode: cfg.format_mode(),
            max_text_len: cfg.forward.truncate_length,
            max_image_bytes: cfg.forward.max_image_bytes,
            send_delay: cfg.send_delay(),
            fetch_timeout: cfg.fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    BotSender,
    ChannelNotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    TooLarge,
    DeliveryFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Image,
    Fallback {
        reason: FallbackReason,
        delivered: bool,
    },
    FetchFailed,
}

/// What happened to one inbound message. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardReport {
    Discarded(DiscardReason),
    Forwarded {
        text_delivered: bool,
        units: Vec<UnitOutcome>,
    },
}

#[derive(Debug, Clone)]
pub struct Forwarder {
    settings: Arc<ForwardSettings>,
    wecom: WecomClient,
    http: Client,
}

impl Forwarder {
    pub fn new(settings: ForwardSettings, wecom: WecomClient, http: Client) -> Self {
        Self {
            settings: Arc::new(settings),
            wecom,
            http,
        }
    }

    pub fn from_config(cfg: &Config, http: Client) -> Result<Self, ConfigError> {
        let webhook_url = cfg
            .wecom
            .webhook_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingWebhookUrl)?;
        let wecom = WecomClient::new(
            http.clone(),
            webhook_url,
            cfg.wecom.secret.clone(),
            cfg.request_timeout(),
        );
        Ok(Self::new(ForwardSettings::from_config(cfg), wecom, http))
    }

    pub fn discard_reason(&self, msg: &InboundMessage) -> Option<DiscardReason> {
        if msg.sender.bot {
            return Some(DiscardReason::BotSender);
        }
        if !self.settings.filter.allows(msg.origin.channel_id) {
            return Some(DiscardReason::ChannelNotAllowed);
        }
        None
    }

    pub fn accepts(&self, msg: &InboundMessage) -> bool {
        self.discard_reason(msg).is_none()
    }

    /// Runs one message to completion. Failures are logged and folded into
    /// the report; nothing here aborts the caller.
    pub async fn handle(&self, msg: InboundMessage) -> ForwardReport {
        let span = info_span!("forward", work_id = %uuid::Uuid::new_v4());
        self.process(msg).instrument(span).await
    }

    async fn process(&self, msg: InboundMessage) -> ForwardReport {
        if let Some(reason) = self.discard_reason(&msg) {
            debug!(?reason, "message discarded");
            return ForwardReport::Discarded(reason);
        }

        let normalized = normalize(&msg, self.settings.mode, self.settings.max_text_len);
        info!(
            sender = %msg.sender.tag(),
            channel = %msg.origin.channel_name,
            images = normalized.images.len(),
            "forwarding message to wecom"
        );

        let text_delivered = match self.wecom.send_text(&normalized.text).await {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    "text delivery failed, continuing with attachments: {}",
                    err.detail()
                );
                false
            }
        };

        let mut units = Vec::with_capacity(normalized.images.len());
        for attachment in &normalized.images {
            units.push(self.forward_image(attachment).await);
            sleep(self.settings.send_delay).await;
        }

        ForwardReport::Forwarded {
            text_delivered,
            units,
        }
    }

    async fn forward_image(&self, attachment: &Attachment) -> UnitOutcome {
        let bytes = match fetch_attachment(&self.http, &attachment.url, self.settings.fetch_timeout)
            .await
        {
            Ok(bytes) => bytes,
            Err(_) => return UnitOutcome::FetchFailed,
        };

        let image = match ImagePayload::new(&bytes, self.settings.max_image_bytes) {
            Ok(image) => image,
            Err(err) => {
                warn!(url = %attachment.url, "{err}, sending link instead");
                return self.send_fallback(attachment, FallbackReason::TooLarge).await;
            }
        };

        match self.wecom.send_image(image).await {
            Ok(_) => UnitOutcome::Image,
            Err(err) => {
                warn!(
                    url = %attachment.url,
                    "image delivery failed, sending link instead: {}",
                    err.detail()
                );
                self.send_fallback(attachment, FallbackReason::DeliveryFailed)
                    .await
            }
        }
    }

    async fn send_fallback(&self, attachment: &Attachment, reason: FallbackReason) -> UnitOutcome {
        let text = fallback_text(attachment, self.settings.max_text_len);
        let delivered = self.wecom.send_text(&text).await.is_ok();
        UnitOutcome::Fallback { reason, delivered }
    }
}

/// Pulls messages off the queue and runs each as its own task. Returns once
/// every sender is dropped and in-flight messages have finished.
pub async fn run_forward_worker(mut rx: mpsc::Receiver<InboundMessage>, forwarder: Forwarder) {
    let mut in_flight = JoinSet::new();
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(msg) => {
                    let forwarder = forwarder.clone();
                    in_flight.spawn(async move { forwarder.handle(msg).await });
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(err) = joined {
                    error!("forward task failed: {err}");
                }
            }
        }
    }
    while let Some(joined) = in_flight.join_next().await {
        if let Err(err) = joined {
            error!("forward task failed: {err}");
        }
    }
}
