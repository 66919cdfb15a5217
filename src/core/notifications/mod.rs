mod dingtalk;

pub use dingtalk::DingTalkNotifier;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::DingTalkConfig;

/// Trait for notification channel implementations.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Factory function to create a notifier based on config. Returns `None`
/// when notifications are disabled or no access token is configured.
pub fn create_notifier(config: &DingTalkConfig) -> Option<Arc<dyn NotificationChannel>> {
    if !config.enable || config.access_token.is_empty() {
        return None;
    }
    Some(Arc::new(DingTalkNotifier::new(
        config.access_token.clone(),
        config.secret.clone(),
    )))
}
