use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    pub content_type: Option<String>,
}

impl Attachment {
    /// Declared content type wins; the filename extension is only consulted
    /// when the source did not report one.
    pub fn is_image(&self) -> bool {
        if let Some(content_type) = self.content_type.as_deref() {
            return content_type.starts_with("image");
        }
        let lower = self.filename.to_lowercase();
        IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    pub fn display_name(&self) -> &str {
        if self.filename.is_empty() {
            "file"
        } else {
            &self.filename
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub display_name: String,
    pub discriminator: String,
    #[serde(default)]
    pub bot: bool,
}

impl Sender {
    pub fn tag(&self) -> String {
        format!("{}#{}", self.display_name, self.discriminator)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    /// `None` for direct messages.
    pub guild_name: Option<String>,
    pub channel_name: String,
    pub channel_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender: Sender,
    pub origin: Origin,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

/// Channel allow-list. Empty means every channel is forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFilter {
    ids: HashSet<u64>,
}

impl ChannelFilter {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn allows(&self, channel_id: Option<u64>) -> bool {
        if self.ids.is_empty() {
            return true;
        }
        channel_id.is_some_and(|id| self.ids.contains(&id))
    }
}
