//! Storage seams the pipeline depends on.
//!
//! The scoring/gating logic never sees a concrete database; it talks to
//! these narrow traits. `postgate-db` provides the Postgres implementation,
//! tests use in-memory fakes.

use chrono::{DateTime, Utc};
use postgate_core::SourceType;
use uuid::Uuid;

use crate::error::IngestError;

/// Review-queue status assigned at creation. This core never changes status
/// after that; the review UI owns the rest of the lifecycle.
pub const STATUS_PENDING_REVIEW: &str = "pending_review";

/// A persisted post as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct StoredPost {
    pub id: i64,
    pub thread_id: String,
    pub workspace_id: Uuid,
    pub status: String,
    pub hot_score: f64,
    pub views: i64,
    pub likes: i64,
    pub replies: i64,
    pub reposts: i64,
}

/// Fields for a new review-queue row. Counters are already resolved to
/// plain integers; `None` metrics collapse to zero at this boundary.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub thread_id: String,
    pub workspace_id: Uuid,
    pub source_handle: Option<String>,
    pub source_type: SourceType,
    pub content: Option<String>,
    pub post_url: String,
    pub media: serde_json::Value,
    pub external_urls: Vec<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub likes: i64,
    pub replies: i64,
    pub reposts: i64,
    pub hot_score: f64,
}

/// The mutable subset of a persisted post: engagement counters and score.
/// Everything else is immutable after creation.
#[derive(Debug, Clone, Copy)]
pub struct EngagementUpdate {
    pub views: i64,
    pub likes: i64,
    pub replies: i64,
    pub reposts: i64,
    pub hot_score: f64,
}

/// Result of the atomic insert-or-get on the natural key.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// The row was created by this call.
    Created(StoredPost),
    /// A row already existed for `(thread_id, workspace_id)`; the existing
    /// row is returned so the caller can take the duplicate path.
    Conflict(StoredPost),
}

/// Persistence operations for review-queue posts.
///
/// `insert_if_absent` must be atomic with respect to concurrent ingestions
/// of the same `(thread_id, workspace_id)`: two racing callers get one
/// `Created` and one `Conflict`, never two rows. The read-then-write check
/// in the pipeline is an optimization, not the correctness mechanism.
pub trait PostStore {
    fn find_by_natural_key(
        &self,
        thread_id: &str,
        workspace_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<StoredPost>, IngestError>> + Send;

    fn insert_if_absent(
        &self,
        post: &NewPost,
    ) -> impl std::future::Future<Output = Result<InsertOutcome, IngestError>> + Send;

    fn update_engagement(
        &self,
        post_id: i64,
        update: &EngagementUpdate,
    ) -> impl std::future::Future<Output = Result<(), IngestError>> + Send;
}

/// A cached follower count for one author.
#[derive(Debug, Clone)]
pub struct CachedFollowerCount {
    pub author_id: String,
    pub follower_count: u64,
}

/// TTL-bounded follower-count cache operations.
pub trait FollowerCacheStore {
    /// Returns cached counts for the given ids updated after
    /// `updated_after`. Stale and missing entries are simply absent.
    fn fresh_entries(
        &self,
        platform: &str,
        author_ids: &[String],
        updated_after: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<CachedFollowerCount>, IngestError>> + Send;

    /// Writes one resolved count. An entry that already exists is refreshed
    /// in place (count and timestamp), restarting its freshness window.
    fn upsert_entry(
        &self,
        platform: &str,
        author_id: &str,
        follower_count: u64,
    ) -> impl std::future::Future<Output = Result<(), IngestError>> + Send;
}
