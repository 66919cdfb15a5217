//! Run report composition and delivery.
//!
//! One report per pipeline run: a single summary line, plus the failing
//! source paths when there are any. The report always goes to the log;
//! delivery through the notification channel is best-effort.

use std::sync::Arc;
use tracing::{info, warn};

use super::models::RunOutcome;
use super::notifications::NotificationChannel;

/// Composes the human-readable summary for one run.
pub fn build(outcome: &RunOutcome) -> String {
    let mut text = format!(
        "total backed-up directories: {}, failed: {}",
        outcome.total_targets,
        outcome.failed()
    );
    if !outcome.is_clean() {
        text.push('\n');
        text.push_str(&outcome.failed_targets.join("\n"));
    }
    text
}

/// Logs the summary and sends it through the notification channel when one
/// is configured.
pub async fn build_and_send(outcome: &RunOutcome, notifier: Option<&Arc<dyn NotificationChannel>>) {
    let text = build(outcome);
    info!("{text}");
    notify(&text, notifier).await;
}

/// Best-effort delivery: a send failure is logged and swallowed, never
/// retried or propagated.
pub async fn notify(text: &str, notifier: Option<&Arc<dyn NotificationChannel>>) {
    if let Some(channel) = notifier {
        if let Err(err) = channel.send(text).await {
            warn!("failed to deliver notification: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_run_has_no_detail_listing() {
        let outcome = RunOutcome::new(3);
        assert_eq!(build(&outcome), "total backed-up directories: 3, failed: 0");
    }

    #[test]
    fn failures_are_listed_one_per_line() {
        let mut outcome = RunOutcome::new(3);
        outcome.record_failure("/var/db");
        assert_eq!(
            build(&outcome),
            "total backed-up directories: 3, failed: 1\n/var/db"
        );

        outcome.record_failure("/var/log/app");
        assert_eq!(
            build(&outcome),
            "total backed-up directories: 3, failed: 2\n/var/db\n/var/log/app"
        );
    }
}
