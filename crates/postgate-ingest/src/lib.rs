//! Post ingestion: metric reconciliation, gating, scoring, and the
//! pipeline that strings them together.
//!
//! The crate is storage-agnostic; persistence and follower caching are
//! injected through the [`PostStore`] and [`FollowerCacheStore`] traits
//! so the pipeline can be exercised against fakes in tests.

pub mod error;
pub mod followers;
pub mod freshness;
pub mod metrics;
pub mod pipeline;
pub mod relevance;
pub mod score;
pub mod spam;
pub mod traits;

pub use error::IngestError;
pub use followers::{FollowerCacheResolver, FollowerCount, FollowerLookup, HttpFollowerLookup};
pub use freshness::check_freshness;
pub use metrics::resolve_metrics;
pub use pipeline::{BatchStats, IngestionPipeline, ProcessOutcome};
pub use relevance::{AlwaysRelevant, HttpRelevanceClassifier, RelevanceClassifier};
pub use score::{
    calculate_hot_score, calculate_topic_score, FollowerTier, ScoringConfig, TopicScore,
};
pub use spam::is_likely_spam;
pub use traits::{
    CachedFollowerCount, EngagementUpdate, FollowerCacheStore, InsertOutcome, NewPost, PostStore,
    StoredPost, STATUS_PENDING_REVIEW,
};
