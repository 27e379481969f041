use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod ingest;
mod score;

#[derive(Debug, Parser)]
#[command(name = "postgate-cli")]
#[command(about = "Postgate ingestion command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Run a batch of scraped posts through the full ingestion pipeline.
    Ingest {
        /// JSON file with the scraped batch (array of {post, raw_text}).
        #[arg(long)]
        file: PathBuf,
        /// Workspace the batch belongs to.
        #[arg(long)]
        workspace: Uuid,
        /// Handle of the configured source the batch was scraped from.
        #[arg(long)]
        source: String,
        /// Platform key for the follower cache.
        #[arg(long, default_value = "threads")]
        platform: String,
        /// Minimum hot score for a post to enter the review queue.
        #[arg(long, default_value_t = 10)]
        threshold: i64,
        /// Workspace-wide maximum post age in hours.
        #[arg(long)]
        max_age_hours: Option<i64>,
        /// Optional topic filter checked by the relevance classifier.
        #[arg(long)]
        topic_filter: Option<String>,
        /// Parse and report without touching the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Score a batch offline and print the results, no database involved.
    Score {
        /// JSON file with the scraped batch (array of {post, raw_text}).
        #[arg(long)]
        file: PathBuf,
        /// Assumed follower count for every author in the batch.
        #[arg(long)]
        followers: Option<u64>,
        /// Score with the topic-discovery model instead of account-trust.
        #[arg(long)]
        topic: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            let config = postgate_core::load_app_config()?;
            init_tracing(&config.log_level);
            let pool = postgate_db::connect_pool(
                &config.database_url,
                postgate_db::PoolConfig::from_app_config(&config),
            )
            .await?;
            let applied = postgate_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Ingest {
            file,
            workspace,
            source,
            platform,
            threshold,
            max_age_hours,
            topic_filter,
            dry_run,
        } => {
            let config = postgate_core::load_app_config()?;
            init_tracing(&config.log_level);
            let settings = postgate_core::WorkspaceScoringSettings {
                hot_score_threshold: threshold,
                max_post_age_hours: max_age_hours,
                topic_filter,
            };
            ingest::run_ingest(
                &config, &file, workspace, &source, &platform, &settings, dry_run,
            )
            .await?;
        }
        Commands::Score {
            file,
            followers,
            topic,
        } => {
            init_tracing("info");
            score::run_score(&file, followers, topic)?;
        }
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
