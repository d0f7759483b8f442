use crate::types::{Attachment, Embed, EmbedField, InboundMessage, Origin, Sender};
use anyhow::Result;
use serenity::all::{Context, EventHandler, GatewayIntents, Message, Ready, User};
use serenity::async_trait;
use serenity::Client;
use std::num::NonZeroU16;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Gateway handler that queues every message for forwarding.
pub struct DiscordHandler {
    tx: mpsc::Sender<InboundMessage>,
}

impl DiscordHandler {
    pub fn new(tx: mpsc::Sender<InboundMessage>) -> Self {
        Self { tx }
    }

    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            bot_id = %ready.user.id,
            "logged in to discord"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if !relays_author(&msg.author) {
            debug!(author = %msg.author.name, "skipping bot message");
            return;
        }

        let guild_name = msg.guild(&ctx.cache).map(|guild| guild.name.clone());
        let channel_name = match msg.channel_id.name(&ctx).await {
            Ok(name) => name,
            Err(_) => msg.channel_id.to_string(),
        };

        let inbound = inbound_from_discord(&msg, guild_name, channel_name);
        if let Err(err) = self.tx.send(inbound).await {
            error!("forward queue closed, dropping discord message: {err}");
        }
    }
}

/// Connects to the gateway and blocks until the client stops.
pub async fn start_discord(token: &str, tx: mpsc::Sender<InboundMessage>) -> Result<()> {
    let mut client = Client::builder(token, DiscordHandler::intents())
        .event_handler(DiscordHandler::new(tx))
        .await?;
    client.start().await?;
    Ok(())
}

pub fn inbound_from_discord(
    msg: &Message,
    guild_name: Option<String>,
    channel_name: String,
) -> InboundMessage {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone());

    InboundMessage {
        sender: Sender {
            display_name,
            discriminator: format_discriminator(msg.author.discriminator),
            bot: msg.author.bot,
        },
        origin: Origin {
            guild_name,
            channel_name,
            channel_id: Some(msg.channel_id.get()),
        },
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| Attachment {
                url: a.url.clone(),
                filename: a.filename.clone(),
                content_type: a.content_type.clone(),
            })
            .collect(),
        embeds: msg
            .embeds
            .iter()
            .map(|e| Embed {
                title: e.title.clone(),
                description: e.description.clone(),
                url: e.url.clone(),
                fields: e
                    .fields
                    .iter()
                    .map(|f| EmbedField {
                        name: f.name.clone(),
                        value: f.value.clone(),
                    })
                    .collect(),
                image_url: e.image.as_ref().map(|i| i.url.clone()),
                thumbnail_url: e.thumbnail.as_ref().map(|t| t.url.clone()),
            })
            .collect(),
    }
}

/// Bot traffic never reaches the queue. The forwarder repeats the check.
pub fn relays_author(author: &User) -> bool {
    !author.bot
}

/// Legacy four digit tag, or `0` for accounts on the new username system.
pub fn format_discriminator(discriminator: Option<NonZeroU16>) -> String {
    match discriminator {
        Some(d) => format!("{:04}", d.get()),
        None => "0".to_string(),
    }
}
