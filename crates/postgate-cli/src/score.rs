//! Score command handler: offline scoring of a scraped batch with no
//! database, useful for inspecting how a batch would fare before ingesting.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;

use postgate_core::RawPost;
use postgate_ingest::{
    calculate_hot_score, calculate_topic_score, resolve_metrics, score::age_hours, ScoringConfig,
};

#[derive(Debug, Deserialize)]
struct BatchItem {
    post: RawPost,
    #[serde(default)]
    raw_text: String,
}

pub(crate) fn run_score(file: &Path, followers: Option<u64>, topic: bool) -> anyhow::Result<()> {
    let contents = fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("failed to read batch file {}: {e}", file.display()))?;
    let items: Vec<BatchItem> = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse batch file {}: {e}", file.display()))?;

    let config = ScoringConfig::default();
    let now = Utc::now();

    for item in &items {
        let metrics = resolve_metrics(item.post.metrics, &item.raw_text);
        if topic {
            let age = item
                .post
                .posted_at
                .map_or(0.0, |posted_at| age_hours(posted_at, now));
            let result = calculate_topic_score(
                &config,
                metrics.likes_or_zero(),
                metrics.replies_or_zero(),
                metrics.reposts_or_zero(),
                0,
                followers,
                age,
            );
            println!(
                "{}\tviews={} likes={} replies={} reposts={}\ttier={} gate={} score={:.2}",
                item.post.thread_id,
                metrics.views_or_zero(),
                metrics.likes_or_zero(),
                metrics.replies_or_zero(),
                metrics.reposts_or_zero(),
                result.tier,
                if result.passes_gate { "pass" } else { "fail" },
                result.score,
            );
        } else {
            let score = calculate_hot_score(
                &config,
                metrics.views_or_zero(),
                metrics.likes_or_zero(),
                metrics.replies_or_zero(),
                metrics.reposts_or_zero(),
                followers,
                item.post.posted_at,
                now,
            );
            println!(
                "{}\tviews={} likes={} replies={} reposts={}\tscore={:.2}",
                item.post.thread_id,
                metrics.views_or_zero(),
                metrics.likes_or_zero(),
                metrics.replies_or_zero(),
                metrics.reposts_or_zero(),
                score,
            );
        }
    }

    println!("scored {} post(s)", items.len());
    Ok(())
}
