//! MySQL backend via sqlx.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{MySql, QueryBuilder};

use super::{PostStore, TableRef, create_database_sql, create_table_sql, insert_prefix};
use crate::config::DatabaseConfig;
use crate::error::{Result, SqlxErrExt};
use crate::models::{Post, PostRow};

/// Rows per INSERT statement. Four binds per row keeps this well under the
/// 65535 placeholder limit.
const INSERT_CHUNK_ROWS: usize = 1000;
const MAX_CONNECTIONS: u32 = 2;

#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    target: TableRef,
}

impl MySqlStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        Self::connect_to(config, TableRef::default_target()?).await
    }

    /// Connects to the server without selecting a database; every statement uses
    /// the fully qualified table name.
    pub async fn connect_to(config: &DatabaseConfig, target: TableRef) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password);

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .connection_err("connect to MySQL")?;

        Ok(Self { pool, target })
    }

    pub fn target(&self) -> &TableRef {
        &self.target
    }

    pub async fn count_rows(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.target.qualified());
        sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .storage_err("count rows")
    }

    /// All rows in insertion order.
    pub async fn rows(&self) -> Result<Vec<PostRow>> {
        let sql = format!(
            "SELECT tweet_id, content, created_at, location FROM {} ORDER BY id",
            self.target.qualified()
        );
        sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .storage_err("read rows")
    }

    /// Drop the table. Only used to reset integration test fixtures.
    pub async fn drop_table(&self) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", self.target.qualified());
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .storage_err("drop table")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PostStore for MySqlStore {
    async fn bootstrap(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .connection_err("acquire connection")?;

        // Names may come back with a binary collation, so decode as bytes.
        let databases: Vec<Vec<u8>> = sqlx::query_scalar("SHOW DATABASES")
            .fetch_all(&mut *conn)
            .await
            .connection_err("list databases")?;

        let wanted = self.target.database.as_str();
        let exists = databases
            .iter()
            .any(|name| String::from_utf8_lossy(name) == wanted);

        if !exists {
            sqlx::query(&create_database_sql(&self.target.database))
                .execute(&mut *conn)
                .await
                .storage_err("create database")?;
            tracing::info!(database = wanted, "Created database");
        }

        sqlx::query(&create_table_sql(&self.target))
            .execute(&mut *conn)
            .await
            .storage_err("create table")?;

        Ok(())
    }

    async fn append(&self, posts: &[Post]) -> Result<u64> {
        if posts.is_empty() {
            return Ok(0);
        }

        let rows: Vec<PostRow> = posts.iter().map(PostRow::from).collect();
        let mut tx = self.pool.begin().await.connection_err("begin transaction")?;
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<MySql> = QueryBuilder::new(insert_prefix(&self.target));
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.tweet_id.clone())
                    .push_bind(row.content.clone())
                    .push_bind(row.created_at)
                    .push_bind(row.location.clone());
            });

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .storage_err("insert posts")?;
            inserted += result.rows_affected();
        }

        tx.commit().await.storage_err("commit posts")?;
        Ok(inserted)
    }
}
