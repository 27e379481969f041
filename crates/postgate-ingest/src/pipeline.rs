//! Ingestion pipeline orchestration.
//!
//! Fixed sequence per post, each step able to short-circuit with a typed
//! [`RejectionReason`]:
//!
//! 1. Resolve metrics from structured counters + raw card text.
//! 2. Freshness gate — reject `no_date` / `freshness`.
//! 3. Duplicate detection — update counters and score, reject `duplicate`.
//! 4. Legacy workspace topic filter via the AI classifier (fail-open).
//! 5. Topic mode only: spam filter — reject `spam`.
//! 6. Mode-appropriate scoring.
//! 7. Threshold / tier gate — reject `engagement`.
//! 8. Atomic insert-or-get persist; a conflicting insert takes the
//!    duplicate path.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use postgate_core::{
    PartialMetrics, RawPost, RejectionReason, SourceConfig, SourceType, WorkspaceScoringSettings,
};
use uuid::Uuid;

use crate::error::IngestError;
use crate::freshness::check_freshness;
use crate::metrics::resolve_metrics;
use crate::relevance::RelevanceClassifier;
use crate::score::{age_hours, calculate_hot_score, calculate_topic_score, ScoringConfig};
use crate::spam::is_likely_spam;
use crate::traits::{EngagementUpdate, InsertOutcome, NewPost, PostStore, StoredPost};

/// What the pipeline did with one post.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// The post entered the review queue.
    Persisted(StoredPost),
    /// The post was declined; the reason is a value for callers to count.
    Rejected(RejectionReason),
}

/// Per-reason rejection tallies for one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub persisted: usize,
    pub no_date: usize,
    pub freshness: usize,
    pub duplicate: usize,
    pub spam: usize,
    pub engagement: usize,
    /// Posts that failed with a store/collaborator error (logged, skipped).
    pub errors: usize,
}

impl BatchStats {
    fn record(&mut self, outcome: &ProcessOutcome) {
        match outcome {
            ProcessOutcome::Persisted(_) => self.persisted += 1,
            ProcessOutcome::Rejected(reason) => match reason {
                RejectionReason::NoDate => self.no_date += 1,
                RejectionReason::Freshness => self.freshness += 1,
                RejectionReason::Duplicate => self.duplicate += 1,
                RejectionReason::Spam => self.spam += 1,
                RejectionReason::Engagement => self.engagement += 1,
            },
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.persisted
            + self.no_date
            + self.freshness
            + self.duplicate
            + self.spam
            + self.engagement
            + self.errors
    }
}

/// The ingestion scoring and gating engine.
///
/// Stateless apart from the injected store and classifier; one instance can
/// process posts concurrently. Duplicate correctness comes from the store's
/// atomic insert-or-get, not from the read-ahead check.
pub struct IngestionPipeline<S, C> {
    store: S,
    classifier: C,
    scoring: ScoringConfig,
}

impl<S, C> IngestionPipeline<S, C>
where
    S: PostStore + Sync,
    C: RelevanceClassifier + Sync,
{
    pub fn new(store: S, classifier: C, scoring: ScoringConfig) -> Self {
        Self {
            store,
            classifier,
            scoring,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one post through the full gate-and-score sequence.
    ///
    /// `follower_count` is the author's resolved follower count, or `None`
    /// when unknown — unknown routes account scoring through the legacy
    /// engagement formula and topic scoring into the `Unknown` tier.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] only for store failures; rejections are
    /// values, and classifier failures are swallowed (fail-open).
    #[allow(clippy::too_many_lines)]
    pub async fn process_post(
        &self,
        raw: &RawPost,
        raw_text: &str,
        source: &SourceConfig,
        settings: &WorkspaceScoringSettings,
        workspace_id: Uuid,
        follower_count: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<ProcessOutcome, IngestError> {
        // 1. Metric reconciliation.
        let metrics = resolve_metrics(raw.metrics, raw_text);

        // 2. Freshness gate.
        if let Some(reason) = check_freshness(
            raw.posted_at,
            source.source_type,
            source.max_age_hours,
            settings.max_post_age_hours,
            now,
        ) {
            tracing::debug!(thread_id = %raw.thread_id, reason = %reason, "post gated on freshness");
            return Ok(ProcessOutcome::Rejected(reason));
        }

        // 3. Duplicate detection. Existing rows get fresh counters and a
        // recomputed score; spam/relevance are not re-run on this path.
        if let Some(existing) = self
            .store
            .find_by_natural_key(&raw.thread_id, workspace_id)
            .await?
        {
            let hot_score = self.compute_score(&metrics, source, follower_count, raw.posted_at, now);
            self.store
                .update_engagement(existing.id, &engagement_update(&metrics, hot_score))
                .await?;
            tracing::debug!(thread_id = %raw.thread_id, post_id = existing.id, "duplicate sighting — counters updated");
            return Ok(ProcessOutcome::Rejected(RejectionReason::Duplicate));
        }

        // 4. Legacy workspace topic filter, fail-open on classifier errors.
        if let (Some(topic), Some(content)) = (settings.topic_filter.as_deref(), raw.content.as_deref())
        {
            match self.classifier.is_relevant(content, topic).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(thread_id = %raw.thread_id, topic, "post not relevant to workspace topic");
                    return Ok(ProcessOutcome::Rejected(RejectionReason::Spam));
                }
                Err(e) => {
                    // Admitting on error is a product decision; make the
                    // outage observable instead of silent.
                    tracing::warn!(
                        event = "classifier_fail_open",
                        thread_id = %raw.thread_id,
                        error = %e,
                        "relevance classifier failed — treating post as relevant"
                    );
                }
            }
        }

        // 5. Spam heuristics guard the discovery firehose only.
        if source.source_type == SourceType::Topic
            && is_likely_spam(raw.content.as_deref(), follower_count)
        {
            tracing::debug!(thread_id = %raw.thread_id, "topic post classified as spam");
            return Ok(ProcessOutcome::Rejected(RejectionReason::Spam));
        }

        // 6. Per-source engagement floor.
        if metrics.likes_or_zero() < source.min_likes
            || metrics.replies_or_zero() < source.min_replies
        {
            return Ok(ProcessOutcome::Rejected(RejectionReason::Engagement));
        }

        // 6b/7. Mode-appropriate score plus threshold / tier gate.
        #[allow(clippy::cast_precision_loss)]
        let threshold = settings.hot_score_threshold as f64;
        let hot_score = match source.source_type {
            SourceType::Account => {
                let score = calculate_hot_score(
                    &self.scoring,
                    metrics.views_or_zero(),
                    metrics.likes_or_zero(),
                    metrics.replies_or_zero(),
                    metrics.reposts_or_zero(),
                    follower_count,
                    raw.posted_at,
                    now,
                ) * source.trust_weight;
                if score < threshold {
                    return Ok(ProcessOutcome::Rejected(RejectionReason::Engagement));
                }
                score
            }
            SourceType::Topic => {
                // posted_at is present here: the freshness gate rejected
                // dateless posts in step 2.
                let age = raw.posted_at.map_or(0.0, |posted_at| age_hours(posted_at, now));
                let topic_score = calculate_topic_score(
                    &self.scoring,
                    metrics.likes_or_zero(),
                    metrics.replies_or_zero(),
                    metrics.reposts_or_zero(),
                    0,
                    follower_count,
                    age,
                );
                if !topic_score.passes_gate {
                    tracing::debug!(
                        thread_id = %raw.thread_id,
                        tier = %topic_score.tier,
                        "topic post below tier gate"
                    );
                    return Ok(ProcessOutcome::Rejected(RejectionReason::Engagement));
                }
                // A freshness-collapsed score rejects even past the gate.
                if topic_score.score <= 0.0 || topic_score.score < threshold {
                    return Ok(ProcessOutcome::Rejected(RejectionReason::Engagement));
                }
                topic_score.score
            }
        };

        // 8. Persist. A conflicting concurrent insert is the duplicate path.
        let new_post = self.build_new_post(raw, &metrics, source, workspace_id, hot_score);
        match self.store.insert_if_absent(&new_post).await? {
            InsertOutcome::Created(stored) => {
                tracing::info!(
                    thread_id = %raw.thread_id,
                    post_id = stored.id,
                    hot_score = format_args!("{hot_score:.2}"),
                    source_type = %source.source_type,
                    "post entered review queue"
                );
                Ok(ProcessOutcome::Persisted(stored))
            }
            InsertOutcome::Conflict(existing) => {
                self.store
                    .update_engagement(existing.id, &engagement_update(&metrics, hot_score))
                    .await?;
                tracing::debug!(
                    thread_id = %raw.thread_id,
                    post_id = existing.id,
                    "lost insert race — treated as duplicate"
                );
                Ok(ProcessOutcome::Rejected(RejectionReason::Duplicate))
            }
        }
    }

    /// Processes a batch with bounded concurrency, tallying outcomes.
    ///
    /// `follower_counts` maps author ids to resolved counts (see
    /// [`crate::followers::FollowerCacheResolver`]); authors missing from
    /// the map are scored with an unknown follower count.
    pub async fn process_batch(
        &self,
        items: &[(RawPost, String)],
        source: &SourceConfig,
        settings: &WorkspaceScoringSettings,
        workspace_id: Uuid,
        follower_counts: &HashMap<String, u64>,
        now: DateTime<Utc>,
        max_concurrent: usize,
    ) -> BatchStats {
        // Failures are logged inside the per-post future, where the post is
        // in scope; `buffer_unordered` yields in completion order.
        let outcomes: Vec<Result<ProcessOutcome, IngestError>> = stream::iter(items)
            .map(|(raw, raw_text)| async move {
                let follower_count = raw
                    .author_id
                    .as_deref()
                    .and_then(|id| follower_counts.get(id).copied());
                let result = self
                    .process_post(
                        raw,
                        raw_text,
                        source,
                        settings,
                        workspace_id,
                        follower_count,
                        now,
                    )
                    .await;
                if let Err(e) = &result {
                    tracing::error!(thread_id = %raw.thread_id, error = %e, "post processing failed");
                }
                result
            })
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await;

        let mut stats = BatchStats::default();
        for outcome in &outcomes {
            match outcome {
                Ok(outcome) => stats.record(outcome),
                Err(_) => stats.errors += 1,
            }
        }
        stats
    }

    /// Score with the mode-appropriate model, as the duplicate path does:
    /// gates are not re-applied, only the number is refreshed.
    fn compute_score(
        &self,
        metrics: &PartialMetrics,
        source: &SourceConfig,
        follower_count: Option<u64>,
        posted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> f64 {
        match source.source_type {
            SourceType::Account => {
                calculate_hot_score(
                    &self.scoring,
                    metrics.views_or_zero(),
                    metrics.likes_or_zero(),
                    metrics.replies_or_zero(),
                    metrics.reposts_or_zero(),
                    follower_count,
                    posted_at,
                    now,
                ) * source.trust_weight
            }
            SourceType::Topic => {
                let age = posted_at.map_or(0.0, |posted_at| age_hours(posted_at, now));
                calculate_topic_score(
                    &self.scoring,
                    metrics.likes_or_zero(),
                    metrics.replies_or_zero(),
                    metrics.reposts_or_zero(),
                    0,
                    follower_count,
                    age,
                )
                .score
            }
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn build_new_post(
        &self,
        raw: &RawPost,
        metrics: &PartialMetrics,
        source: &SourceConfig,
        workspace_id: Uuid,
        hot_score: f64,
    ) -> NewPost {
        NewPost {
            thread_id: raw.thread_id.clone(),
            workspace_id,
            source_handle: Some(source.handle.clone()),
            source_type: source.source_type,
            content: raw.content.clone(),
            post_url: raw.post_url.clone(),
            media: serde_json::to_value(&raw.media_urls).unwrap_or_default(),
            external_urls: raw.external_urls.clone(),
            posted_at: raw.posted_at,
            views: metrics.views_or_zero() as i64,
            likes: metrics.likes_or_zero() as i64,
            replies: metrics.replies_or_zero() as i64,
            reposts: metrics.reposts_or_zero() as i64,
            hot_score,
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
fn engagement_update(metrics: &PartialMetrics, hot_score: f64) -> EngagementUpdate {
    EngagementUpdate {
        views: metrics.views_or_zero() as i64,
        likes: metrics.likes_or_zero() as i64,
        replies: metrics.replies_or_zero() as i64,
        reposts: metrics.reposts_or_zero() as i64,
        hot_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_stats_records_each_reason_once() {
        let mut stats = BatchStats::default();
        for reason in [
            RejectionReason::NoDate,
            RejectionReason::Freshness,
            RejectionReason::Duplicate,
            RejectionReason::Spam,
            RejectionReason::Engagement,
        ] {
            stats.record(&ProcessOutcome::Rejected(reason));
        }
        assert_eq!(stats.no_date, 1);
        assert_eq!(stats.freshness, 1);
        assert_eq!(stats.duplicate, 1);
        assert_eq!(stats.spam, 1);
        assert_eq!(stats.engagement, 1);
        assert_eq!(stats.persisted, 0);
        assert_eq!(stats.total(), 5);
    }
}
