//! Database operations for the `follower_cache` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `follower_cache` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowerCacheRow {
    pub id: i64,
    pub platform: String,
    pub platform_id: String,
    pub follower_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Returns cached counts for the given platform ids updated after
/// `updated_after`. Stale entries are filtered out here so callers only
/// ever see counts within their freshness window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fresh_follower_entries(
    pool: &PgPool,
    platform: &str,
    platform_ids: &[String],
    updated_after: DateTime<Utc>,
) -> Result<Vec<FollowerCacheRow>, DbError> {
    let rows = sqlx::query_as::<_, FollowerCacheRow>(
        "SELECT id, platform, platform_id, follower_count, updated_at \
         FROM follower_cache \
         WHERE platform = $1 AND platform_id = ANY($2) AND updated_at > $3",
    )
    .bind(platform)
    .bind(platform_ids)
    .bind(updated_after)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Upserts one follower count.
///
/// Conflicts on `(platform, platform_id)` refresh `follower_count` and
/// `updated_at` in place, which is what restarts the 24h freshness window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_follower_entry(
    pool: &PgPool,
    platform: &str,
    platform_id: &str,
    follower_count: i64,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO follower_cache (platform, platform_id, follower_count) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (platform, platform_id) DO UPDATE SET \
             follower_count = EXCLUDED.follower_count, \
             updated_at     = NOW()",
    )
    .bind(platform)
    .bind(platform_id)
    .bind(follower_count)
    .execute(pool)
    .await?;

    Ok(())
}
