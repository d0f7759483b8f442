use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Characters left untouched when embedding the signature in a query string.
const SIGN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Appends `timestamp` and `sign` query parameters to `webhook_url` when a
/// secret is configured. The webhook URL is expected to already carry `?key=`.
pub fn sign_url(webhook_url: &str, secret: &str) -> String {
    sign_url_at(webhook_url, secret, Utc::now().timestamp_millis())
}

pub fn sign_url_at(webhook_url: &str, secret: &str, timestamp_ms: i64) -> String {
    if secret.is_empty() {
        return webhook_url.to_string();
    }
    let Some(signature) = compute_signature(secret, timestamp_ms) else {
        return webhook_url.to_string();
    };
    let encoded = utf8_percent_encode(&signature, SIGN_ENCODE_SET);
    format!("{}&timestamp={}&sign={}", webhook_url, timestamp_ms, encoded)
}

/// Base64 HMAC-SHA256 of `"{timestamp}\n{secret}"` keyed by the secret.
pub fn compute_signature(secret: &str, timestamp_ms: i64) -> Option<String> {
    let string_to_sign = format!("{}\n{}", timestamp_ms, secret);
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        warn!("could not initialise webhook signer, sending unsigned");
        return None;
    };
    mac.update(string_to_sign.as_bytes());
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}
