//! Persistence for the `store_data_to_db` task.
//!
//! Database and table names come from fixed configuration but still pass through
//! [`Identifier`] before they reach SQL text. Row values are always bound.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::constants::{CONTENT_WIDTH, DB_NAME, LOCATION_WIDTH, TABLE_NAME, TWEET_ID_WIDTH};
use crate::error::{EtlError, Result};
use crate::models::Post;

pub use mysql::MySqlStore;

/// MySQL's identifier length limit
const MAX_IDENTIFIER_LEN: usize = 64;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Create the database and table if they do not exist. Safe to repeat.
    async fn bootstrap(&self) -> Result<()>;

    /// Append every post as a new row in one transaction. Returns rows inserted.
    async fn append(&self, posts: &[Post]) -> Result<u64>;
}

/// Bootstrap then append.
pub async fn persist<S: PostStore + ?Sized>(store: &S, posts: &[Post]) -> Result<u64> {
    store.bootstrap().await?;
    store.append(posts).await
}

/// A schema object name restricted to `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: &str) -> Result<Self> {
        let valid = !name.is_empty()
            && name.len() <= MAX_IDENTIFIER_LEN
            && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if !valid {
            return Err(EtlError::Config(format!("invalid SQL identifier: {:?}", name)));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

/// Fully qualified destination table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub database: Identifier,
    pub table: Identifier,
}

impl TableRef {
    pub fn new(database: &str, table: &str) -> Result<Self> {
        Ok(Self {
            database: Identifier::new(database)?,
            table: Identifier::new(table)?,
        })
    }

    /// `tweets_101_etl`.`tweets`
    pub fn default_target() -> Result<Self> {
        Self::new(DB_NAME, TABLE_NAME)
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.database.quoted(), self.table.quoted())
    }
}

/// utf8mb4 so emoji survive on servers that still default to latin1 or utf8mb3.
pub fn create_database_sql(database: &Identifier) -> String {
    format!(
        "CREATE DATABASE IF NOT EXISTS {} CHARACTER SET utf8mb4",
        database.quoted()
    )
}

pub fn create_table_sql(target: &TableRef) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {}(
    id INT(10) ZEROFILL NOT NULL AUTO_INCREMENT PRIMARY KEY,
    tweet_id VARCHAR({}),
    content VARCHAR({}),
    created_at DATETIME,
    location VARCHAR({})
)"#,
        target.qualified(),
        TWEET_ID_WIDTH,
        CONTENT_WIDTH,
        LOCATION_WIDTH
    )
}

pub fn insert_prefix(target: &TableRef) -> String {
    format!(
        "INSERT INTO {} (tweet_id, content, created_at, location) ",
        target.qualified()
    )
}
