//! Ingest command handler.
//!
//! Reads a scraped batch from disk, resolves follower counts once for the
//! whole batch, then runs every post through the ingestion pipeline.
//! Per-post failures are logged and skipped rather than propagated so a
//! single bad post does not abort the run.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use postgate_core::{AppConfig, RawPost, WorkspaceScoringSettings};
use postgate_ingest::{
    AlwaysRelevant, FollowerCacheResolver, HttpFollowerLookup, HttpRelevanceClassifier,
    IngestError, IngestionPipeline, RelevanceClassifier, ScoringConfig,
};

/// One scraped post as it appears in the batch file: the structured post
/// plus the raw card text the metric resolver mines for counters.
#[derive(Debug, Deserialize)]
struct BatchItem {
    post: RawPost,
    #[serde(default)]
    raw_text: String,
}

/// Relevance classifier selected from config: HTTP when an endpoint is set,
/// otherwise everything passes.
enum Classifier {
    Always(AlwaysRelevant),
    Http(HttpRelevanceClassifier),
}

impl RelevanceClassifier for Classifier {
    async fn is_relevant(&self, content: &str, topic: &str) -> Result<bool, IngestError> {
        match self {
            Self::Always(c) => c.is_relevant(content, topic).await,
            Self::Http(c) => c.is_relevant(content, topic).await,
        }
    }
}

fn load_batch(path: &Path) -> anyhow::Result<Vec<(RawPost, String)>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read batch file {}: {e}", path.display()))?;
    let items: Vec<BatchItem> = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse batch file {}: {e}", path.display()))?;
    Ok(items
        .into_iter()
        .map(|item| (item.post, item.raw_text))
        .collect())
}

pub(crate) async fn run_ingest(
    config: &AppConfig,
    file: &Path,
    workspace_id: Uuid,
    source_handle: &str,
    platform: &str,
    settings: &WorkspaceScoringSettings,
    dry_run: bool,
) -> anyhow::Result<()> {
    let sources = postgate_core::load_sources(&config.sources_path)?;
    let source = sources
        .find(source_handle)
        .ok_or_else(|| anyhow::anyhow!("source '{source_handle}' not found in sources file"))?;

    let items = load_batch(file)?;
    if items.is_empty() {
        println!("batch file is empty, nothing to do");
        return Ok(());
    }

    if dry_run {
        let unresolved = items
            .iter()
            .filter(|(post, _)| post.metrics.engagement_unresolved())
            .count();
        println!(
            "dry-run: {} post(s) for source '{}' ({}), {} with unresolved structured metrics",
            items.len(),
            source.handle,
            source.source_type,
            unresolved
        );
        return Ok(());
    }

    let pool = postgate_db::connect_pool(
        &config.database_url,
        postgate_db::PoolConfig::from_app_config(config),
    )
    .await?;
    let store = postgate_db::PgStore::new(pool);

    let now = Utc::now();
    let author_ids: Vec<String> = items
        .iter()
        .filter_map(|(post, _)| post.author_id.clone())
        .collect();
    let followers = match &config.follower_lookup_url {
        Some(url) => {
            let lookup = HttpFollowerLookup::new(url, config.http_timeout_secs, &config.http_user_agent)?;
            FollowerCacheResolver::new(&store, &lookup, platform)
                .with_chunking(
                    config.lookup_chunk_size,
                    Duration::from_millis(config.lookup_chunk_delay_ms),
                )
                .with_cache_ttl_hours(config.follower_cache_ttl_hours)
                .resolve(&author_ids, now)
                .await
        }
        None => {
            tracing::warn!("no follower lookup endpoint configured, scoring without follower counts");
            std::collections::HashMap::new()
        }
    };

    let classifier = match &config.classifier_url {
        Some(url) => Classifier::Http(HttpRelevanceClassifier::new(
            url,
            config.http_timeout_secs,
            &config.http_user_agent,
        )?),
        None => Classifier::Always(AlwaysRelevant),
    };

    let pipeline = IngestionPipeline::new(store, classifier, ScoringConfig::default());
    let stats = pipeline
        .process_batch(
            &items,
            source,
            settings,
            workspace_id,
            &followers,
            now,
            config.ingest_max_concurrent_posts,
        )
        .await;

    println!(
        "processed {} post(s): {} persisted, {} stale, {} dateless, {} duplicates, {} spam, {} low engagement, {} errors",
        stats.total(),
        stats.persisted,
        stats.freshness,
        stats.no_date,
        stats.duplicate,
        stats.spam,
        stats.engagement,
        stats.errors,
    );

    #[allow(clippy::cast_precision_loss)]
    let pending = postgate_db::count_pending_posts(
        pipeline.store().pool(),
        workspace_id,
        settings.hot_score_threshold as f64,
    )
    .await?;
    println!("{pending} post(s) pending review in workspace {workspace_id}");
    if let Some(latest) = postgate_db::latest_post_created_at(pipeline.store().pool(), workspace_id).await? {
        println!("most recent post created at {latest}");
    }

    Ok(())
}
