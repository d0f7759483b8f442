use crate::payload::{ImagePayload, OutboundPayload};
use crate::sign::sign_url;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("webhook http error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("webhook api error {errcode}: {errmsg}")]
    Api { errcode: Value, errmsg: String },
    #[error("webhook request timeout")]
    Timeout,
    #[error("webhook request failed: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Short detail string for logs: response body, parsed response, or cause.
    pub fn detail(&self) -> String {
        match self {
            DeliveryError::Http { body, .. } => body.clone(),
            DeliveryError::Api { errcode, errmsg } => {
                serde_json::json!({"errcode": errcode, "errmsg": errmsg}).to_string()
            }
            DeliveryError::Timeout => "timeout".to_string(),
            DeliveryError::Transport(msg) => msg.clone(),
        }
    }
}

/// Group robot webhook client. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct WecomClient {
    http: Client,
    webhook_url: String,
    secret: String,
    timeout: Duration,
}

impl WecomClient {
    pub fn new(http: Client, webhook_url: String, secret: String, timeout: Duration) -> Self {
        Self {
            http,
            webhook_url,
            secret,
            timeout,
        }
    }

    pub async fn send_text(&self, content: &str) -> Result<String, DeliveryError> {
        self.deliver(&OutboundPayload::text(content)).await
    }

    pub async fn send_image(&self, image: ImagePayload) -> Result<String, DeliveryError> {
        self.deliver(&OutboundPayload::image(image)).await
    }

    /// Posts one payload. Never retries; on success returns the raw body.
    pub async fn deliver(&self, payload: &OutboundPayload) -> Result<String, DeliveryError> {
        let url = sign_url(&self.webhook_url, &self.secret);
        let resp = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|err| transport_error(payload.kind(), err))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| transport_error(payload.kind(), err))?;

        check_response(status, body)
    }
}

fn transport_error(kind: &str, err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        error!(kind, "webhook request timeout");
        DeliveryError::Timeout
    } else {
        error!(kind, "webhook request exception: {err}");
        DeliveryError::Transport(err.to_string())
    }
}

/// Status and `errcode` are independent failure layers; both must pass.
pub fn check_response(status: StatusCode, body: String) -> Result<String, DeliveryError> {
    if status != StatusCode::OK {
        error!(status = status.as_u16(), "webhook http error: {body}");
        return Err(DeliveryError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let parsed = match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => {
            debug!("webhook returned non-json body: {body}");
            return Ok(body);
        }
    };

    let errcode = parsed.get("errcode").cloned().unwrap_or(Value::from(0));
    if errcode.as_i64() == Some(0) {
        return Ok(body);
    }
    let errmsg = parsed
        .get("errmsg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    error!(%errcode, "webhook api error: {errmsg}");
    Err(DeliveryError::Api { errcode, errmsg })
}
