use wecom_bridge::sign::{compute_signature, sign_url, sign_url_at};

const WEBHOOK: &str = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=abc";

#[test]
fn test_empty_secret_returns_url_unchanged() {
    assert_eq!(sign_url(WEBHOOK, ""), WEBHOOK);
    assert_eq!(sign_url_at(WEBHOOK, "", 1_700_000_000_000), WEBHOOK);
}

#[test]
fn test_known_signature() {
    let sig = compute_signature("SEC123", 1_700_000_000_000).unwrap();
    assert_eq!(sig, "lkcPI1uoxBY1gUnCnnPH1Kkru0Hqjo7rFpA3haIVhEQ=");
}

#[test]
fn test_signed_url_with_fixed_clock() {
    let url = sign_url_at(WEBHOOK, "SEC123", 1_700_000_000_000);
    assert_eq!(
        url,
        format!(
            "{}&timestamp=1700000000000&sign=lkcPI1uoxBY1gUnCnnPH1Kkru0Hqjo7rFpA3haIVhEQ%3D",
            WEBHOOK
        )
    );
}

#[test]
fn test_slash_and_padding_are_escaped() {
    let url = sign_url_at(WEBHOOK, "secret", 1);
    assert!(url.ends_with("&timestamp=1&sign=fzqLUufx9hhv%2FJfGQR0kwpwoJJBqmqYsjz4EnnO47oc%3D"));
}

#[test]
fn test_signed_url_appends_exactly_one_of_each_param() {
    let url = sign_url(WEBHOOK, "another-secret");
    assert!(url.starts_with(WEBHOOK));
    assert_eq!(url.matches("&timestamp=").count(), 1);
    assert_eq!(url.matches("&sign=").count(), 1);
    assert_eq!(url.matches("timestamp=").count(), 1);
    assert_eq!(url.matches("sign=").count(), 1);
}

#[test]
fn test_same_clock_same_url() {
    let a = sign_url_at(WEBHOOK, "SEC123", 42);
    let b = sign_url_at(WEBHOOK, "SEC123", 42);
    assert_eq!(a, b);
    assert_ne!(a, sign_url_at(WEBHOOK, "SEC123", 43));
}

#[test]
fn test_timestamp_is_milliseconds() {
    let url = sign_url(WEBHOOK, "SEC123");
    let ts = url
        .split("&timestamp=")
        .nth(1)
        .and_then(|rest| rest.split('&').next())
        .unwrap();
    assert_eq!(ts.len(), 13);
    assert!(ts.chars().all(|c| c.is_ascii_digit()));
}
