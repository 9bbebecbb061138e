//! Fetch recent geo-filtered tweets and append them to MySQL.
//!
//! A run is three tasks in a fixed chain: `get_tweets` ([`twitter`]),
//! `store_data_to_db` ([`store`]) and `notify` ([`notify`]), wired together by
//! [`pipeline::run_once`]. [`schedule`] repeats that every 30 minutes.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod schedule;
pub mod store;
pub mod twitter;

pub use config::Config;
pub use error::{EtlError, Result};
pub use models::{Post, RunReport};
