use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::notifications::NotificationChannel;

/// Read-only capabilities constructed once at startup and injected into the
/// pipeline and report builder. No ambient globals.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub notifier: Option<Arc<dyn NotificationChannel>>,
}

impl AppContext {
    pub fn new(config: AppConfig, notifier: Option<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            config: Arc::new(config),
            notifier,
        }
    }
}
