use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tweets_etl::config::Config;
use tweets_etl::schedule::{self, ScheduleSpec};
use tweets_etl::store::{MySqlStore, PostStore};
use tweets_etl::twitter::{SearchQuery, TwitterClient};

#[derive(Parser)]
#[command(name = "tweets-etl", about = "Fetch recent tweets and append them to MySQL")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run get_tweets >> store_data_to_db >> notify once (default)
    Run,
    /// Run the pipeline every 30 minutes, retrying a failed run once
    Schedule,
    /// Create the database and table if missing, then exit
    Bootstrap,
    /// Fetch tweets and print them as JSON lines without storing them
    Fetch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tweets_etl=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    config.log_redacted();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let store = MySqlStore::connect(&config.database).await?;
            let result = schedule::run_pass(&config, &store).await;
            store.close().await;
            let report = result.context("pipeline run failed")?;
            tracing::info!(fetched = report.fetched, inserted = report.inserted, "Run finished");
        }
        Command::Schedule => {
            let store = MySqlStore::connect(&config.database).await?;
            schedule::run_scheduler(config, store, ScheduleSpec::default()).await?;
        }
        Command::Bootstrap => {
            let store = MySqlStore::connect(&config.database).await?;
            store.bootstrap().await.context("bootstrap failed")?;
            tracing::info!(table = %store.target().qualified(), "Schema ready");
            store.close().await;
        }
        Command::Fetch => {
            let client = TwitterClient::connect(&config.twitter).await?;
            let posts = client.search(&SearchQuery::default()).await?;
            for post in &posts {
                println!("{}", serde_json::to_string(post)?);
            }
            tracing::info!(count = posts.len(), "Fetched tweets");
        }
    }

    Ok(())
}
