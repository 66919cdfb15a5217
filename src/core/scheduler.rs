//! Periodic trigger for the backup pipeline.
//!
//! The configured day count becomes a day-of-month style cron expression
//! (`0 0 */{days} * *`, local time): a run at midnight on every matching day
//! of the month. The daemon runs the pipeline once at startup and then once
//! per fire, sleeping in between; runs cannot overlap because the loop only
//! computes the next fire after the previous run returns.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::info;

use super::pipeline::Pipeline;
use crate::context::AppContext;

/// A day-count period expressed as a cron day-of-month step.
#[derive(Debug, Clone)]
pub struct Schedule {
    expression: String,
}

impl Schedule {
    pub fn every_days(days: u32) -> Result<Self> {
        let schedule = Self {
            expression: format!("0 0 */{days} * *"),
        };
        // Surface a bad expression at startup, not at the first fire.
        schedule.next_fire(Local::now())?;
        Ok(schedule)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first fire time strictly after `after`.
    pub fn next_fire(&self, after: DateTime<Local>) -> Result<DateTime<Local>> {
        cron_parser::parse(&self.expression, &after)
            .with_context(|| format!("invalid schedule expression '{}'", self.expression))
    }
}

pub struct Scheduler {
    schedule: Schedule,
    pipeline: Pipeline,
}

impl Scheduler {
    pub fn new(ctx: AppContext) -> Result<Self> {
        let days = ctx.config.period_days()?;
        Ok(Self {
            schedule: Schedule::every_days(days)?,
            pipeline: Pipeline::new(ctx),
        })
    }

    /// Runs the pipeline once immediately, then on every schedule fire.
    /// Loops until the process is terminated externally; there is no
    /// graceful in-process shutdown path.
    pub async fn start(&self) -> Result<()> {
        info!(schedule = %self.schedule.expression(), "backup schedule starting");
        self.pipeline.run().await;

        loop {
            let now = Local::now();
            let next = self.schedule.next_fire(now)?;
            info!(next = %next, "next backup run scheduled");

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
            self.pipeline.run().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daily_schedule_fires_at_next_midnight() {
        let schedule = Schedule::every_days(1).unwrap();
        let next = schedule.next_fire(local(2026, 8, 8, 14, 30)).unwrap();
        assert_eq!(next, local(2026, 8, 9, 0, 0));
    }

    #[test]
    fn weekly_period_steps_days_of_month() {
        // */7 matches days 1, 8, 15, 22, 29.
        let schedule = Schedule::every_days(7).unwrap();
        let next = schedule.next_fire(local(2026, 8, 8, 0, 30)).unwrap();
        assert_eq!(next, local(2026, 8, 15, 0, 0));
    }

    #[test]
    fn step_wraps_to_the_first_of_the_next_month() {
        let schedule = Schedule::every_days(7).unwrap();
        let next = schedule.next_fire(local(2026, 8, 29, 0, 30)).unwrap();
        assert_eq!(next, local(2026, 9, 1, 0, 0));
    }

    #[test]
    fn fire_is_strictly_after_the_reference_instant() {
        let schedule = Schedule::every_days(1).unwrap();
        let midnight = local(2026, 8, 8, 0, 0);
        let next = schedule.next_fire(midnight).unwrap();
        assert!(next > midnight);
    }
}
