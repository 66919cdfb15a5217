use anyhow::{Result, bail};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use super::NotificationChannel;

type HmacSha256 = Hmac<Sha256>;

const WEBHOOK_URL: &str = "https://oapi.dingtalk.com/robot/send";

/// DingTalk robot webhook channel sending plain text messages.
///
/// When a secret is configured the webhook requires signed requests:
/// `timestamp` (milliseconds) and `sign` query parameters, where the sign is
/// the base64 HMAC-SHA256 of `"{timestamp}\n{secret}"` keyed by the secret.
pub struct DingTalkNotifier {
    access_token: String,
    secret: Option<String>,
    client: reqwest::Client,
}

impl DingTalkNotifier {
    pub fn new(access_token: String, secret: Option<String>) -> Self {
        Self {
            access_token,
            secret,
            client: reqwest::Client::new(),
        }
    }

    fn sign(secret: &str, timestamp_ms: i64) -> String {
        let payload = format!("{timestamp_ms}\n{secret}");
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl NotificationChannel for DingTalkNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let payload = json!({
            "msgtype": "text",
            "text": { "content": text }
        });

        let mut request = self
            .client
            .post(WEBHOOK_URL)
            .query(&[("access_token", self.access_token.as_str())]);

        if let Some(secret) = &self.secret {
            let timestamp = Utc::now().timestamp_millis();
            let sign = Self::sign(secret, timestamp);
            request = request.query(&[
                ("timestamp", timestamp.to_string().as_str()),
                ("sign", sign.as_str()),
            ]);
        }

        let response = request.json(&payload).send().await?;
        if !response.status().is_success() {
            bail!("dingtalk webhook responded {}", response.status());
        }

        // The robot API reports rejection with HTTP 200 and an errcode body.
        let body: serde_json::Value = response.json().await?;
        let errcode = body.get("errcode").and_then(|v| v.as_i64()).unwrap_or(0);
        if errcode != 0 {
            let errmsg = body
                .get("errmsg")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            bail!("dingtalk webhook rejected message: {errcode} {errmsg}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_is_deterministic_for_fixed_inputs() {
        let first = DingTalkNotifier::sign("secret", 1_722_000_000_000);
        let second = DingTalkNotifier::sign("secret", 1_722_000_000_000);
        assert_eq!(first, second);

        // Base64 of a 32-byte HMAC-SHA256 digest.
        assert_eq!(first.len(), 44);
    }

    #[test]
    fn sign_varies_with_timestamp_and_secret() {
        let base = DingTalkNotifier::sign("secret", 1_722_000_000_000);
        assert_ne!(base, DingTalkNotifier::sign("secret", 1_722_000_000_001));
        assert_ne!(base, DingTalkNotifier::sign("other", 1_722_000_000_000));
    }
}
