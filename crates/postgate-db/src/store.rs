//! Postgres-backed implementation of the pipeline storage traits.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use postgate_ingest::{
    CachedFollowerCount, EngagementUpdate, FollowerCacheStore, IngestError, InsertOutcome, NewPost,
    PostStore, StoredPost,
};

use crate::posts::PostRow;
use crate::{follower_cache, posts, DbError};

/// Adapter from the `postgate-db` query modules to the traits the ingestion
/// pipeline consumes. Clones share the underlying pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_stored(row: PostRow) -> StoredPost {
    StoredPost {
        id: row.id,
        thread_id: row.thread_id,
        workspace_id: row.workspace_id,
        status: row.status,
        hot_score: row.hot_score,
        views: row.views,
        likes: row.likes,
        replies: row.replies,
        reposts: row.reposts,
    }
}

fn store_err(e: DbError) -> IngestError {
    IngestError::Store(e.to_string())
}

impl PostStore for PgStore {
    async fn find_by_natural_key(
        &self,
        thread_id: &str,
        workspace_id: Uuid,
    ) -> Result<Option<StoredPost>, IngestError> {
        let row = posts::find_post_by_natural_key(&self.pool, thread_id, workspace_id)
            .await
            .map_err(store_err)?;
        Ok(row.map(to_stored))
    }

    async fn insert_if_absent(&self, post: &NewPost) -> Result<InsertOutcome, IngestError> {
        if let Some(created) = posts::insert_post_if_absent(&self.pool, post)
            .await
            .map_err(store_err)?
        {
            return Ok(InsertOutcome::Created(to_stored(created)));
        }

        // The insert hit the natural-key conflict, so the row exists.
        let existing = posts::find_post_by_natural_key(&self.pool, &post.thread_id, post.workspace_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| {
                IngestError::Store(format!(
                    "post {} vanished between conflicting insert and read",
                    post.thread_id
                ))
            })?;
        Ok(InsertOutcome::Conflict(to_stored(existing)))
    }

    async fn update_engagement(
        &self,
        post_id: i64,
        update: &EngagementUpdate,
    ) -> Result<(), IngestError> {
        posts::update_post_engagement(&self.pool, post_id, update)
            .await
            .map_err(store_err)
    }
}

impl FollowerCacheStore for PgStore {
    async fn fresh_entries(
        &self,
        platform: &str,
        author_ids: &[String],
        updated_after: DateTime<Utc>,
    ) -> Result<Vec<CachedFollowerCount>, IngestError> {
        let rows =
            follower_cache::fresh_follower_entries(&self.pool, platform, author_ids, updated_after)
                .await
                .map_err(store_err)?;
        Ok(rows
            .into_iter()
            .map(|row| CachedFollowerCount {
                author_id: row.platform_id,
                follower_count: u64::try_from(row.follower_count).unwrap_or(0),
            })
            .collect())
    }

    async fn upsert_entry(
        &self,
        platform: &str,
        author_id: &str,
        follower_count: u64,
    ) -> Result<(), IngestError> {
        let count = i64::try_from(follower_count).unwrap_or(i64::MAX);
        follower_cache::upsert_follower_entry(&self.pool, platform, author_id, count)
            .await
            .map_err(store_err)
    }
}
