use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBody {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub base64: String,
    pub md5: String,
}

impl ImagePayload {
    /// Encodes `bytes` for the webhook. Refuses anything above `max_bytes`.
    pub fn new(bytes: &[u8], max_bytes: usize) -> Result<Self, PayloadError> {
        if bytes.len() > max_bytes {
            return Err(PayloadError::TooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }
        Ok(Self {
            base64: STANDARD.encode(bytes),
            md5: hex::encode(Md5::digest(bytes)),
        })
    }
}

/// Webhook message body, tagged by `msgtype`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msgtype")]
pub enum OutboundPayload {
    #[serde(rename = "text")]
    Text { text: TextBody },
    #[serde(rename = "image")]
    Image { image: ImagePayload },
}

impl OutboundPayload {
    pub fn text(content: impl Into<String>) -> Self {
        OutboundPayload::Text {
            text: TextBody {
                content: content.into(),
            },
        }
    }

    pub fn image(image: ImagePayload) -> Self {
        OutboundPayload::Image { image }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundPayload::Text { .. } => "text",
            OutboundPayload::Image { .. } => "image",
        }
    }
}
