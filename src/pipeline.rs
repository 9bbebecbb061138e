//! The three-task run: `get_tweets` >> `store_data_to_db` >> `notify`.
//!
//! Each task is awaited before the next one starts. The first error ends the run
//! and is returned unchanged; later tasks do not execute.

use async_trait::async_trait;
use tracing::Instrument;

use crate::constants::{TASK_GET_TWEETS, TASK_NOTIFY, TASK_STORE};
use crate::error::Result;
use crate::models::{Post, RunReport};
use crate::notify::Notifier;
use crate::store::{PostStore, persist};

/// Task ids in dependency order
pub const TASKS: [&str; 3] = [TASK_GET_TWEETS, TASK_STORE, TASK_NOTIFY];

/// Anything that can produce one batch of posts for a run.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Post>>;
}

pub async fn run_once(
    source: &dyn PostSource,
    store: &dyn PostStore,
    notifier: &dyn Notifier,
) -> Result<RunReport> {
    let posts = source
        .fetch()
        .instrument(tracing::info_span!("task", id = TASK_GET_TWEETS))
        .await?;
    tracing::info!(count = posts.len(), "Fetched tweets");

    let inserted = persist(store, &posts)
        .instrument(tracing::info_span!("task", id = TASK_STORE))
        .await?;
    tracing::info!(inserted, "Stored tweets");

    let report = RunReport {
        fetched: posts.len(),
        inserted,
    };

    tracing::info_span!("task", id = TASK_NOTIFY).in_scope(|| notifier.notify(&report));

    Ok(report)
}
