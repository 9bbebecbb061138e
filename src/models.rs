//! Shared data models used across modules

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{CONTENT_WIDTH, LOCATION_WIDTH, TWEET_ID_WIDTH};

/// A flattened tweet as it moves from the fetch stage to the store stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub tweet_id: String,
    pub content: String,
    /// UTC wall-clock time of authorship
    pub created_at: NaiveDateTime,
    pub location: Option<String>,
}

/// A post clipped to the `tweets` column widths, ready to bind.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PostRow {
    pub tweet_id: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub location: Option<String>,
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        Self {
            tweet_id: truncate_chars(&post.tweet_id, TWEET_ID_WIDTH),
            content: truncate_chars(&post.content, CONTENT_WIDTH),
            created_at: post.created_at,
            location: post
                .location
                .as_deref()
                .map(|l| truncate_chars(l, LOCATION_WIDTH)),
        }
    }
}

/// Keep at most `max` characters. VARCHAR widths count characters, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Summary handed to the notify task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub inserted: u64,
}
