//! Domain types for scraped posts and pipeline outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Default workspace hot-score threshold when none is configured.
pub const DEFAULT_HOT_SCORE_THRESHOLD: i64 = 10;

/// Engagement counters as captured by the scraper.
///
/// Each field is `None` when the scraper could not resolve it from the
/// structured post card. A genuine zero is `Some(0)`. The scraper itself
/// reports `0` for both cases, so the serde boundary maps incoming `0` to
/// `None`; the metric resolver in `postgate-ingest` is responsible for
/// filling unresolved fields from raw text. Conversion back to plain
/// integers happens only at the persistence boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMetrics {
    #[serde(default, deserialize_with = "zero_as_none")]
    pub views: Option<u64>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub replies: Option<u64>,
    #[serde(default, deserialize_with = "zero_as_none")]
    pub reposts: Option<u64>,
}

impl PartialMetrics {
    /// Returns `true` if every counter other than `views` is unresolved.
    #[must_use]
    pub fn engagement_unresolved(&self) -> bool {
        self.likes.is_none() && self.replies.is_none() && self.reposts.is_none()
    }

    /// Views with unresolved treated as zero (persistence boundary only).
    #[must_use]
    pub fn views_or_zero(&self) -> u64 {
        self.views.unwrap_or(0)
    }

    /// Likes with unresolved treated as zero (persistence boundary only).
    #[must_use]
    pub fn likes_or_zero(&self) -> u64 {
        self.likes.unwrap_or(0)
    }

    /// Replies with unresolved treated as zero (persistence boundary only).
    #[must_use]
    pub fn replies_or_zero(&self) -> u64 {
        self.replies.unwrap_or(0)
    }

    /// Reposts with unresolved treated as zero (persistence boundary only).
    #[must_use]
    pub fn reposts_or_zero(&self) -> u64 {
        self.reposts.unwrap_or(0)
    }
}

/// Deserializes a counter where the scraper's `0` means "unresolved".
fn zero_as_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<u64>::deserialize(deserializer)?;
    Ok(value.filter(|&v| v != 0))
}

/// One media attachment on a scraped post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    /// Media kind as reported by the scraper, e.g. `"image"` or `"video"`.
    pub media_type: String,
    /// Poster frame for videos, when present.
    pub cover_url: Option<String>,
}

/// A post as produced by the external scraper, before any gating.
///
/// Transient: produced once per scrape sighting and consumed once by the
/// ingestion pipeline. The full inner card text travels alongside as a plain
/// string and is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    /// Natural external id of the post (unique per platform).
    pub thread_id: String,
    pub content: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<MediaItem>,
    /// Missing or unparseable timestamps are a hard rejection downstream.
    pub posted_at: Option<DateTime<Utc>>,
    pub post_url: String,
    #[serde(default)]
    pub external_urls: Vec<String>,
    #[serde(default)]
    pub metrics: PartialMetrics,
    /// Platform id of the author, used for follower-count resolution.
    pub author_id: Option<String>,
}

/// Per-workspace scoring knobs, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceScoringSettings {
    pub hot_score_threshold: i64,
    pub max_post_age_hours: Option<i64>,
    /// Legacy free-text relevance filter; when set, topic posts are checked
    /// against it by the AI classifier (fail-open).
    pub topic_filter: Option<String>,
}

impl Default for WorkspaceScoringSettings {
    fn default() -> Self {
        Self {
            hot_score_threshold: DEFAULT_HOT_SCORE_THRESHOLD,
            max_post_age_hours: None,
            topic_filter: None,
        }
    }
}

/// Why the pipeline declined to enqueue a post.
///
/// Rejections are values, not errors: callers aggregate per-reason counts
/// for observability without any exception handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NoDate,
    Freshness,
    Duplicate,
    Spam,
    Engagement,
}

impl RejectionReason {
    /// Stable wire/log name for the reason.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::NoDate => "no_date",
            RejectionReason::Freshness => "freshness",
            RejectionReason::Duplicate => "duplicate",
            RejectionReason::Spam => "spam",
            RejectionReason::Engagement => "engagement",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_metrics_zero_deserializes_as_unresolved() {
        let m: PartialMetrics =
            serde_json::from_str(r#"{"views":0,"likes":12,"replies":0,"reposts":3}"#).unwrap();
        assert_eq!(m.views, None);
        assert_eq!(m.likes, Some(12));
        assert_eq!(m.replies, None);
        assert_eq!(m.reposts, Some(3));
    }

    #[test]
    fn partial_metrics_missing_fields_default_to_unresolved() {
        let m: PartialMetrics = serde_json::from_str("{}").unwrap();
        assert_eq!(m, PartialMetrics::default());
        assert!(m.engagement_unresolved());
    }

    #[test]
    fn engagement_unresolved_false_when_any_counter_set() {
        let m = PartialMetrics {
            replies: Some(1),
            ..PartialMetrics::default()
        };
        assert!(!m.engagement_unresolved());
    }

    #[test]
    fn or_zero_accessors_collapse_unresolved() {
        let m = PartialMetrics {
            views: Some(10),
            ..PartialMetrics::default()
        };
        assert_eq!(m.views_or_zero(), 10);
        assert_eq!(m.likes_or_zero(), 0);
        assert_eq!(m.replies_or_zero(), 0);
        assert_eq!(m.reposts_or_zero(), 0);
    }

    #[test]
    fn rejection_reason_wire_names() {
        assert_eq!(RejectionReason::NoDate.as_str(), "no_date");
        assert_eq!(RejectionReason::Freshness.as_str(), "freshness");
        assert_eq!(RejectionReason::Duplicate.as_str(), "duplicate");
        assert_eq!(RejectionReason::Spam.as_str(), "spam");
        assert_eq!(RejectionReason::Engagement.as_str(), "engagement");
        assert_eq!(RejectionReason::NoDate.to_string(), "no_date");
    }

    #[test]
    fn raw_post_deserializes_from_scraper_json() {
        let json = r#"{
            "thread_id": "t_123",
            "content": "hello",
            "posted_at": "2026-08-01T12:00:00Z",
            "post_url": "https://threads.example/p/t_123",
            "metrics": {"views": 0, "likes": 5, "replies": 0, "reposts": 0},
            "author_id": "acct_9"
        }"#;
        let post: RawPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.thread_id, "t_123");
        assert!(post.media_urls.is_empty());
        assert!(post.external_urls.is_empty());
        assert_eq!(post.metrics.likes, Some(5));
        assert_eq!(post.metrics.views, None);
    }

    #[test]
    fn workspace_settings_default_threshold() {
        let settings = WorkspaceScoringSettings::default();
        assert_eq!(settings.hot_score_threshold, DEFAULT_HOT_SCORE_THRESHOLD);
        assert!(settings.max_post_age_hours.is_none());
        assert!(settings.topic_filter.is_none());
    }
}
