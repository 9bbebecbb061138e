//! In-process scheduling with apalis-cron.
//!
//! Fires the pipeline every 30 minutes. A failed run is retried once after a
//! minute; a second failure is logged and the tick ends. Ticks are not fenced
//! against each other, so a slow run can overlap the next one.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use apalis::prelude::*;
use apalis_cron::{CronStream, Schedule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::models::RunReport;
use crate::notify::LogNotifier;
use crate::pipeline::run_once;
use crate::store::MySqlStore;
use crate::twitter::TwitterClient;

/// Every 30 minutes, on the minute (seconds-resolution cron)
pub const DEFAULT_CRON: &str = "0 */30 * * * *";
const DEFAULT_RETRIES: u32 = 1;
const DEFAULT_RETRY_DELAY_SECS: u64 = 60;
const WORKER_NAME: &str = "tweets-etl";

/// How a scheduled run is triggered and retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSpec {
    pub cron: String,
    pub retry: RetryPolicy,
    /// There is no mail transport; both flags stay off.
    pub email_on_failure: bool,
    pub email_on_retry: bool,
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        Self {
            cron: DEFAULT_CRON.to_string(),
            retry: RetryPolicy::default(),
            email_on_failure: false,
            email_on_retry: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Run `op`, retrying up to `retries` more times. Returns the last error.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        delay_secs = self.delay.as_secs(),
                        error = %e,
                        "Run failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Cron tick payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTick {
    pub scheduled_at: DateTime<Utc>,
}

impl From<DateTime<Utc>> for PipelineTick {
    fn from(dt: DateTime<Utc>) -> Self {
        PipelineTick { scheduled_at: dt }
    }
}

/// Shared context for scheduled runs
#[derive(Clone)]
pub struct ScheduleContext {
    pub config: Config,
    pub store: MySqlStore,
    pub retry: RetryPolicy,
}

/// One full pass against the live services. The Twitter client is rebuilt (and
/// re-authenticated) every time; the MySQL pool is reused.
pub async fn run_pass(config: &Config, store: &MySqlStore) -> Result<RunReport> {
    let client = TwitterClient::connect(&config.twitter).await?;
    run_once(&client, store, &LogNotifier).await
}

/// Job handler. Always returns Ok; failures are logged after the retry budget
/// is spent.
async fn run_tick(tick: PipelineTick, ctx: Data<ScheduleContext>) -> std::result::Result<(), Error> {
    tracing::info!(scheduled_at = %tick.scheduled_at, "Scheduled run starting");

    match ctx.retry.run(|| run_pass(&ctx.config, &ctx.store)).await {
        Ok(report) => {
            tracing::info!(
                fetched = report.fetched,
                inserted = report.inserted,
                "Scheduled run succeeded"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Scheduled run failed");
        }
    }
    Ok(())
}

/// Start the cron worker and block until the monitor exits.
pub async fn run_scheduler(config: Config, store: MySqlStore, spec: ScheduleSpec) -> anyhow::Result<()> {
    let schedule = Schedule::from_str(&spec.cron)
        .with_context(|| format!("invalid cron expression {:?}", spec.cron))?;

    tracing::info!(
        cron = spec.cron.as_str(),
        retries = spec.retry.retries,
        retry_delay_secs = spec.retry.delay.as_secs(),
        email_on_failure = spec.email_on_failure,
        email_on_retry = spec.email_on_retry,
        "Scheduler starting"
    );

    let ctx = ScheduleContext {
        config,
        store,
        retry: spec.retry,
    };

    let worker = WorkerBuilder::new(WORKER_NAME)
        .data(ctx)
        .backend(CronStream::new(schedule))
        .build_fn(run_tick);

    Monitor::new()
        .register(worker)
        .run()
        .await
        .context("scheduler monitor failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::EtlError;

    fn immediate(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_default_schedule() {
        let spec = ScheduleSpec::default();
        assert_eq!(spec.cron, "0 */30 * * * *");
        assert_eq!(spec.retry.retries, 1);
        assert_eq!(spec.retry.delay, Duration::from_secs(60));
        assert!(!spec.email_on_failure);
        assert!(!spec.email_on_retry);
        assert!(Schedule::from_str(&spec.cron).is_ok());
    }

    #[test]
    fn test_tick_from_datetime() {
        let now = Utc::now();
        assert_eq!(PipelineTick::from(now).scheduled_at, now);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_one_failure() {
        let calls = AtomicU32::new(0);
        let result = immediate(1)
            .run(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(EtlError::TransientNetwork("connection reset".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = immediate(1)
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(EtlError::Connection(format!("attempt {}", n)))
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(err.to_string().contains("attempt 1"));
    }

    #[tokio::test]
    async fn test_success_does_not_retry() {
        let calls = AtomicU32::new(0);
        immediate(3)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
