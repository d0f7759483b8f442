use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("attachment download returned http {0}")]
    Status(u16),
    #[error("attachment download timeout")]
    Timeout,
    #[error("attachment download failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Downloads an attachment body. Size is not checked here.
pub async fn fetch_attachment(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Bytes, FetchError> {
    info!(url, "downloading attachment");
    let result = download(client, url, timeout).await;
    if let Err(err) = &result {
        warn!(url, "{err}");
    }
    result
}

async fn download(client: &Client, url: &str, timeout: Duration) -> Result<Bytes, FetchError> {
    let resp = client.get(url).timeout(timeout).send().await?;
    if resp.status() != StatusCode::OK {
        return Err(FetchError::Status(resp.status().as_u16()));
    }
    Ok(resp.bytes().await?)
}
