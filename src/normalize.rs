//! Turns an inbound chat message into the text relayed to the webhook,
//! plus the image attachments that get their own delivery.

use crate::types::{Attachment, Embed, InboundMessage};

const PLATFORM_TAG: &str = "[Discord]";
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// Images are delivered separately; only other attachments are linked.
    #[default]
    ImageAware,
    /// Every attachment is linked in the text, nothing else is sent.
    LinksOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub text: String,
    pub images: Vec<Attachment>,
    pub links: Vec<Attachment>,
}

pub fn normalize(msg: &InboundMessage, mode: FormatMode, max_len: usize) -> NormalizedMessage {
    let guild = msg.origin.guild_name.as_deref().unwrap_or("DM");
    let mut parts = vec![
        format!("{} {} / {}", PLATFORM_TAG, guild, msg.origin.channel_name),
        format!("{}:", msg.sender.tag()),
    ];
    if !msg.content.is_empty() {
        parts.push(msg.content.clone());
    }

    let (images, links): (Vec<Attachment>, Vec<Attachment>) = match mode {
        FormatMode::ImageAware => msg.attachments.iter().cloned().partition(|a| a.is_image()),
        FormatMode::LinksOnly => (Vec::new(), msg.attachments.clone()),
    };

    if !links.is_empty() {
        parts.push(
            match mode {
                FormatMode::ImageAware => "Attachment links:",
                FormatMode::LinksOnly => "Attachments:",
            }
            .to_string(),
        );
        parts.extend(links.iter().map(|a| a.url.clone()));
    }

    if !msg.embeds.is_empty() {
        parts.push("Embeds:".to_string());
        for embed in &msg.embeds {
            push_embed_lines(&mut parts, embed, mode);
        }
    }

    let text = truncate_text(parts.join("\n").trim(), max_len);
    NormalizedMessage {
        text,
        images,
        links,
    }
}

fn push_embed_lines(parts: &mut Vec<String>, embed: &Embed, mode: FormatMode) {
    if let Some(title) = present(&embed.title) {
        parts.push(format!("- title: {}", title));
    }
    if let Some(description) = present(&embed.description) {
        parts.push(format!("- description: {}", description));
    }
    match mode {
        FormatMode::ImageAware => {
            if let Some(url) = present(&embed.url) {
                parts.push(format!("- url: {}", url));
            }
        }
        FormatMode::LinksOnly => {
            for field in &embed.fields {
                parts.push(format!("- {}: {}", field.name, field.value));
            }
            if let Some(image) = present(&embed.image_url) {
                parts.push(format!("- image: {}", image));
            }
            if let Some(thumbnail) = present(&embed.thumbnail_url) {
                parts.push(format!("- thumbnail: {}", thumbnail));
            }
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Text sent in place of an image that could not be delivered as one.
pub fn fallback_text(attachment: &Attachment, max_len: usize) -> String {
    truncate_text(
        &format!("Attachment: {}\n{}", attachment.display_name(), attachment.url),
        max_len,
    )
}

/// Caps `text` at `max_len` characters, marking the cut with `...`.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len < ELLIPSIS.len() {
        return text.chars().take(max_len).collect();
    }
    let mut out: String = text.chars().take(max_len - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}
