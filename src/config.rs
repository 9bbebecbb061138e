//! Runtime configuration loaded from environment variables.
//!
//! Nothing here is validated up front. Missing Twitter credentials are reported
//! as an authentication failure when the client connects, and missing MySQL
//! credentials as a connection failure.

use std::env;

use crate::error::{EtlError, Result};

const DEFAULT_MYSQL_HOST: &str = "localhost";
const DEFAULT_MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, Default)]
pub struct TwitterCredentials {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
}

impl TwitterCredentials {
    pub fn from_env() -> Self {
        Self {
            consumer_key: optional_env("TWITTER_API_KEY"),
            consumer_secret: optional_env("TWITTER_API_SECRET"),
            access_token: optional_env("TWITTER_ACCESS_TOKEN"),
            access_token_secret: optional_env("TWITTER_ACCESS_TOKEN_SECRET"),
        }
    }

    /// Names of the variables that are unset or empty.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("TWITTER_API_KEY", &self.consumer_key),
            ("TWITTER_API_SECRET", &self.consumer_secret),
            ("TWITTER_ACCESS_TOKEN", &self.access_token),
            ("TWITTER_ACCESS_TOKEN_SECRET", &self.access_token_secret),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let port = match optional_env("MYSQL_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| EtlError::Config(format!("MYSQL_PORT is not a port: {}", raw)))?,
            None => DEFAULT_MYSQL_PORT,
        };

        Ok(Self {
            host: optional_env("MYSQL_HOST").unwrap_or_else(|| DEFAULT_MYSQL_HOST.to_string()),
            port,
            user: optional_env("MYSQL_USER").unwrap_or_default(),
            password: optional_env("MYSQL_PASS").unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub twitter: TwitterCredentials,
    pub database: DatabaseConfig,
}

impl Config {
    /// Load from the process environment, reading `.env` first if one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Ok(Self {
            twitter: TwitterCredentials::from_env(),
            database: DatabaseConfig::from_env()?,
        })
    }

    /// Log the effective configuration without secrets.
    pub fn log_redacted(&self) {
        tracing::info!(
            mysql_host = self.database.host.as_str(),
            mysql_port = self.database.port,
            mysql_user = self.database.user.as_str(),
            twitter_missing = ?self.twitter.missing(),
            "Loaded configuration"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
