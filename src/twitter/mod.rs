//! Twitter v1.1 client used by the `get_tweets` task.
//!
//! The client is a capability: it is only handed out once the credentials have
//! been checked against `account/verify_credentials`, so the fetch stage never runs
//! unauthenticated.

pub mod oauth;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::TwitterCredentials;
use crate::error::{EtlError, Result};
use crate::models::Post;
use crate::pipeline::PostSource;

pub use oauth::OAuthKeys;
pub use types::{Account, SearchQuery, SearchResponse, Status};

const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct TwitterClient {
    keys: OAuthKeys,
    base_url: String,
    http: Client,
    account: Account,
}

impl TwitterClient {
    /// Authenticate against the public API.
    pub async fn connect(credentials: &TwitterCredentials) -> Result<Self> {
        Self::connect_to(DEFAULT_API_BASE, credentials).await
    }

    /// Authenticate against an alternative base URL (same path layout as v1.1).
    pub async fn connect_to(base_url: &str, credentials: &TwitterCredentials) -> Result<Self> {
        let keys = keys_from(credentials)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut client = Self {
            keys,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            account: Account {
                id_str: String::new(),
                screen_name: String::new(),
            },
        };

        // 401/403 come back as Authentication; an unreachable API stays TransientNetwork.
        client.account = client
            .get_json("account/verify_credentials.json", &[("skip_status", "true".to_string())])
            .await?;

        tracing::info!(
            account_id = client.account.id_str.as_str(),
            screen_name = client.account.screen_name.as_str(),
            "Authenticated with Twitter"
        );
        Ok(client)
    }

    /// One page of search results. No retry.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Post>> {
        let response: SearchResponse = self.get_json("search/tweets.json", &query.params()).await?;

        response
            .statuses
            .into_iter()
            .map(Post::try_from)
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let authorization = oauth::authorization_header(&self.keys, "GET", &url, &borrowed)?;

        let resp = self
            .http
            .get(with_query(&url, &borrowed))
            .header("Authorization", authorization)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl PostSource for TwitterClient {
    async fn fetch(&self) -> Result<Vec<Post>> {
        self.search(&SearchQuery::default()).await
    }
}

fn keys_from(credentials: &TwitterCredentials) -> Result<OAuthKeys> {
    let missing = credentials.missing();
    if !missing.is_empty() {
        return Err(EtlError::Authentication(format!(
            "missing credentials: {}",
            missing.join(", ")
        )));
    }

    Ok(OAuthKeys {
        consumer_key: credentials.consumer_key.clone().unwrap_or_default(),
        consumer_secret: credentials.consumer_secret.clone().unwrap_or_default(),
        token: credentials.access_token.clone().unwrap_or_default(),
        token_secret: credentials.access_token_secret.clone().unwrap_or_default(),
    })
}

/// Query string encoded exactly as it was signed.
fn with_query(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", oauth::percent_encode(k), oauth::percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", url, query)
}

fn status_error(status: StatusCode, body: String) -> EtlError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            EtlError::Authentication(format!("status {}: {}", status, body))
        }
        _ => EtlError::TransientNetwork(format!("status {}: {}", status, body)),
    }
}
