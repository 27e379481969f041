//! Offline unit tests for postgate-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use postgate_core::{AppConfig, Environment};
use postgate_db::{FollowerCacheRow, PoolConfig, PostRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        sources_path: PathBuf::from("./config/sources.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        follower_lookup_url: None,
        classifier_url: None,
        http_timeout_secs: 30,
        http_user_agent: "ua".to_string(),
        lookup_chunk_size: 5,
        lookup_chunk_delay_ms: 1000,
        follower_cache_ttl_hours: 24,
        ingest_max_concurrent_posts: 4,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`PostRow`] carries the projection
/// the pipeline expects. No database required.
#[test]
fn post_row_has_expected_fields() {
    use uuid::Uuid;

    let row = PostRow {
        id: 1_i64,
        thread_id: "thread_abc".to_string(),
        workspace_id: Uuid::nil(),
        status: "pending_review".to_string(),
        hot_score: 12.5_f64,
        views: 900,
        likes: 80,
        replies: 12,
        reposts: 9,
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.thread_id, "thread_abc");
    assert_eq!(row.status, "pending_review");
    assert!(row.hot_score > 12.0);
    assert_eq!(row.views, 900);
}

/// Compile-time smoke test for [`FollowerCacheRow`].
#[test]
fn follower_cache_row_has_expected_fields() {
    use chrono::Utc;

    let row = FollowerCacheRow {
        id: 3_i64,
        platform: "threads".to_string(),
        platform_id: "acct_123".to_string(),
        follower_count: 1_200,
        updated_at: Utc::now(),
    };

    assert_eq!(row.platform, "threads");
    assert_eq!(row.platform_id, "acct_123");
    assert_eq!(row.follower_count, 1_200);
}
