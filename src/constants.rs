//! Application constants

/// Target database, created on first run
pub const DB_NAME: &str = "tweets_101_etl";

/// Append-only table holding one row per fetched tweet
pub const TABLE_NAME: &str = "tweets";

/// Column widths of the `tweets` table, in characters
pub const TWEET_ID_WIDTH: usize = 20;
pub const CONTENT_WIDTH: usize = 200;
pub const LOCATION_WIDTH: usize = 100;

/// Task ids in execution order
pub const TASK_GET_TWEETS: &str = "get_tweets";
pub const TASK_STORE: &str = "store_data_to_db";
pub const TASK_NOTIFY: &str = "notify";

/// Line emitted by the notify task
pub const COMPLETION_MESSAGE: &str = "Operation Completed!";
