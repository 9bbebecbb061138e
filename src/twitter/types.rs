//! Wire types for the v1.1 search endpoint and their mapping onto [`Post`].

use chrono::DateTime;
use serde::Deserialize;

use crate::error::{EtlError, Result};
use crate::models::Post;

/// Format of `created_at` in v1.1 payloads, e.g. `Wed Oct 10 20:19:24 +0000 2018`
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// The fixed search this job runs. Not exposed for configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub keyword: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: String,
    pub result_type: String,
    pub lang: String,
    pub include_entities: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            keyword: "covid".to_string(),
            latitude: 55.378051,
            longitude: -3.435973,
            radius: "1000mi".to_string(),
            result_type: "recent".to_string(),
            lang: "en".to_string(),
            include_entities: false,
        }
    }
}

impl SearchQuery {
    pub fn geocode(&self) -> String {
        format!("{},{},{}", self.latitude, self.longitude, self.radius)
    }

    /// Query parameters in the order they are sent.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.keyword.clone()),
            ("geocode", self.geocode()),
            ("result_type", self.result_type.clone()),
            ("lang", self.lang.clone()),
            ("include_entities", self.include_entities.to_string()),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub statuses: Vec<Status>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    pub id_str: String,
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub geo: Option<Geo>,
}

/// `{"type": "Point", "coordinates": [lat, long]}`
#[derive(Debug, Deserialize)]
pub struct Geo {
    pub coordinates: [f64; 2],
}

impl Geo {
    pub fn render(&self) -> String {
        format!("{},{}", self.coordinates[0], self.coordinates[1])
    }
}

/// Minimal slice of `account/verify_credentials`
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id_str: String,
    pub screen_name: String,
}

impl TryFrom<Status> for Post {
    type Error = EtlError;

    fn try_from(status: Status) -> Result<Self> {
        let created_at = DateTime::parse_from_str(&status.created_at, CREATED_AT_FORMAT)
            .map_err(|e| {
                EtlError::Parse(format!(
                    "tweet {} has bad created_at {:?}: {}",
                    status.id_str, status.created_at, e
                ))
            })?
            .naive_utc();

        Ok(Post {
            tweet_id: status.id_str,
            content: status.text,
            created_at,
            location: status.geo.as_ref().map(Geo::render),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SEARCH_PAYLOAD: &str = r#"{
        "statuses": [
            {
                "id": 1344924562081337344,
                "id_str": "1344924562081337344",
                "text": "covid update",
                "created_at": "Fri Jan 01 00:00:00 +0000 2021",
                "geo": null,
                "user": {"screen_name": "someone"}
            },
            {
                "id": 1344925820741525505,
                "id_str": "1344925820741525505",
                "text": "covid news",
                "created_at": "Fri Jan 01 01:05:00 +0100 2021",
                "geo": {"type": "Point", "coordinates": [55.9533, -3.1883]}
            }
        ],
        "search_metadata": {"count": 15}
    }"#;

    #[test]
    fn test_default_query_params() {
        let params = SearchQuery::default().params();
        assert_eq!(
            params,
            vec![
                ("q", "covid".to_string()),
                ("geocode", "55.378051,-3.435973,1000mi".to_string()),
                ("result_type", "recent".to_string()),
                ("lang", "en".to_string()),
                ("include_entities", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_statuses_map_to_posts() {
        let response: SearchResponse = serde_json::from_str(SEARCH_PAYLOAD).unwrap();
        let posts: Vec<Post> = response
            .statuses
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].tweet_id, "1344924562081337344");
        assert_eq!(posts[0].content, "covid update");
        assert_eq!(posts[0].location, None);
        assert_eq!(
            posts[0].created_at,
            NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );

        // Offsets are normalised to UTC
        assert_eq!(
            posts[1].created_at,
            NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(0, 5, 0)
                .unwrap()
        );
        assert_eq!(posts[1].location.as_deref(), Some("55.9533,-3.1883"));
    }

    #[test]
    fn test_missing_geo_field_is_none() {
        let status: Status = serde_json::from_str(
            r#"{"id_str": "7", "text": "t", "created_at": "Wed Oct 10 20:19:24 +0000 2018"}"#,
        )
        .unwrap();
        let post = Post::try_from(status).unwrap();
        assert_eq!(post.location, None);
    }

    #[test]
    fn test_bad_created_at_is_a_parse_error() {
        let status = Status {
            id_str: "1".into(),
            text: "x".into(),
            created_at: "2021-01-01T00:00:00".into(),
            geo: None,
        };
        assert!(matches!(Post::try_from(status), Err(EtlError::Parse(_))));
    }

    #[test]
    fn test_account_reads_verify_credentials_payload() {
        let account: Account = serde_json::from_str(
            r#"{"id": 6253282, "id_str": "6253282", "screen_name": "twitterapi", "name": "Twitter API"}"#,
        )
        .unwrap();
        assert_eq!(account.id_str, "6253282");
        assert_eq!(account.screen_name, "twitterapi");
    }
}
