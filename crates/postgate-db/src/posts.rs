//! Database operations for the `posts` review queue.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use postgate_ingest::{EngagementUpdate, NewPost};

use crate::DbError;

const POST_COLUMNS: &str =
    "id, thread_id, workspace_id, status, hot_score, views, likes, replies, reposts";

/// A row from the `posts` table, projected to the fields the pipeline needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
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

/// Finds a post by its natural key `(thread_id, workspace_id)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_post_by_natural_key(
    pool: &PgPool,
    thread_id: &str,
    workspace_id: Uuid,
) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE thread_id = $1 AND workspace_id = $2"
    ))
    .bind(thread_id)
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a post unless its natural key already exists.
///
/// `ON CONFLICT DO NOTHING ... RETURNING` yields a row only when this call
/// created it, which makes the insert-or-get atomic under concurrent
/// ingestion: two racing inserts of the same key produce exactly one row,
/// and the loser sees `Ok(None)`. Callers that get `None` can re-read the
/// surviving row with [`find_post_by_natural_key`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_post_if_absent(pool: &PgPool, post: &NewPost) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "INSERT INTO posts \
             (thread_id, workspace_id, source_handle, source_type, content, post_url, \
              media, external_urls, posted_at, views, likes, replies, reposts, hot_score) \
         VALUES ($1, $2, $3, $4, $5, $6, \
                 $7::jsonb, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (thread_id, workspace_id) DO NOTHING \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(&post.thread_id)
    .bind(post.workspace_id)
    .bind(&post.source_handle)
    .bind(post.source_type.to_string())
    .bind(&post.content)
    .bind(&post.post_url)
    .bind(&post.media)
    .bind(&post.external_urls)
    .bind(post.posted_at)
    .bind(post.views)
    .bind(post.likes)
    .bind(post.replies)
    .bind(post.reposts)
    .bind(post.hot_score)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Refreshes the mutable engagement fields of an existing post.
///
/// `status` and descriptive fields are deliberately untouched; only the
/// counters and score move after creation.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has the given id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_post_engagement(
    pool: &PgPool,
    post_id: i64,
    update: &EngagementUpdate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE posts SET \
             views      = $2, \
             likes      = $3, \
             replies    = $4, \
             reposts    = $5, \
             hot_score  = $6, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(post_id)
    .bind(update.views)
    .bind(update.likes)
    .bind(update.replies)
    .bind(update.reposts)
    .bind(update.hot_score)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Counts posts in a workspace with scores at or above `min_score`, most
/// useful for operational spot checks.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_pending_posts(
    pool: &PgPool,
    workspace_id: Uuid,
    min_score: f64,
) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM posts \
         WHERE workspace_id = $1 AND status = 'pending_review' AND hot_score >= $2",
    )
    .bind(workspace_id)
    .bind(min_score)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Timestamp of the most recently created post in a workspace, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_post_created_at(
    pool: &PgPool,
    workspace_id: Uuid,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT MAX(created_at) FROM posts WHERE workspace_id = $1",
    )
    .bind(workspace_id)
    .fetch_one(pool)
    .await?;

    Ok(created_at)
}
