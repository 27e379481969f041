//! Follower-count resolution with a TTL-bounded cache and a paced external
//! lookup.
//!
//! The external account-lookup collaborator is rate limited, so unresolved
//! ids are fetched in small chunks with a fixed pause between chunks. The
//! pacing is deliberate backpressure, not a bottleneck to remove.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::traits::FollowerCacheStore;

/// Default number of ids per lookup call.
pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// Default pause between lookup chunks.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_secs(1);

/// Cache entries older than this are refreshed before use.
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// One resolved follower count from the lookup collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerCount {
    pub id: String,
    pub follower_count: u64,
}

/// External account-lookup collaborator.
pub trait FollowerLookup {
    fn batch_fetch(
        &self,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<FollowerCount>, IngestError>> + Send;
}

/// HTTP implementation of [`FollowerLookup`].
///
/// POSTs `{"ids": [...]}` to `{base_url}/accounts/followers` and expects a
/// JSON array of `{id, follower_count}` objects. Non-2xx responses are typed
/// errors; retry policy belongs to the enclosing queue layer, not here.
pub struct HttpFollowerLookup {
    client: reqwest::Client,
    url: String,
}

impl HttpFollowerLookup {
    /// Creates a lookup client with the given timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/accounts/followers", base_url.trim_end_matches('/')),
        })
    }
}

#[derive(Serialize)]
struct BatchFetchRequest<'a> {
    ids: &'a [String],
}

impl FollowerLookup for HttpFollowerLookup {
    async fn batch_fetch(&self, ids: &[String]) -> Result<Vec<FollowerCount>, IngestError> {
        let response = self
            .client
            .post(&self.url)
            .json(&BatchFetchRequest { ids })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        response
            .json::<Vec<FollowerCount>>()
            .await
            .map_err(|e| IngestError::Lookup(format!("lookup response parse error: {e}")))
    }
}

/// Resolves follower counts for a batch of author ids, cache first.
pub struct FollowerCacheResolver<'a, S, L> {
    cache: &'a S,
    lookup: &'a L,
    platform: String,
    chunk_size: usize,
    chunk_delay: Duration,
    cache_ttl_hours: i64,
}

impl<'a, S, L> FollowerCacheResolver<'a, S, L>
where
    S: FollowerCacheStore,
    L: FollowerLookup,
{
    pub fn new(cache: &'a S, lookup: &'a L, platform: impl Into<String>) -> Self {
        Self {
            cache,
            lookup,
            platform: platform.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
        }
    }

    #[must_use]
    pub fn with_chunking(mut self, chunk_size: usize, chunk_delay: Duration) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.chunk_delay = chunk_delay;
        self
    }

    #[must_use]
    pub fn with_cache_ttl_hours(mut self, hours: i64) -> Self {
        self.cache_ttl_hours = hours;
        self
    }

    /// Resolves follower counts for every distinct id in `author_ids`.
    ///
    /// Fresh cache entries (within the TTL) are authoritative and skip the
    /// network. Remaining ids go to the lookup collaborator in chunks of
    /// `chunk_size` with a `chunk_delay` pause between chunks; results are
    /// written back to the cache as they arrive.
    ///
    /// Degrades gracefully: a failed cache read or a failed chunk is logged
    /// and its ids are simply absent from the result. Callers must treat a
    /// missing id as "unknown follower count", never as zero.
    pub async fn resolve<I>(&self, author_ids: I, now: DateTime<Utc>) -> HashMap<String, u64>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        // Distinct ids, original order preserved for deterministic chunking.
        let mut seen = HashSet::new();
        let ids: Vec<String> = author_ids
            .into_iter()
            .map(|id| id.as_ref().to_owned())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();

        let mut resolved: HashMap<String, u64> = HashMap::new();
        if ids.is_empty() {
            return resolved;
        }

        let updated_after = now - chrono::Duration::hours(self.cache_ttl_hours);
        match self
            .cache
            .fresh_entries(&self.platform, &ids, updated_after)
            .await
        {
            Ok(entries) => {
                for entry in entries {
                    resolved.insert(entry.author_id, entry.follower_count);
                }
            }
            Err(e) => {
                tracing::warn!(
                    platform = %self.platform,
                    error = %e,
                    "follower cache read failed — resolving all ids via lookup"
                );
            }
        }

        let unresolved: Vec<String> = ids
            .into_iter()
            .filter(|id| !resolved.contains_key(id))
            .collect();
        if unresolved.is_empty() {
            return resolved;
        }

        let chunk_count = unresolved.len().div_ceil(self.chunk_size);
        for (index, chunk) in unresolved.chunks(self.chunk_size).enumerate() {
            match self.lookup.batch_fetch(chunk).await {
                Ok(counts) => {
                    for count in counts {
                        if let Err(e) = self
                            .cache
                            .upsert_entry(&self.platform, &count.id, count.follower_count)
                            .await
                        {
                            tracing::warn!(
                                platform = %self.platform,
                                author_id = %count.id,
                                error = %e,
                                "follower cache write failed"
                            );
                        }
                        resolved.insert(count.id, count.follower_count);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        platform = %self.platform,
                        chunk_len = chunk.len(),
                        error = %e,
                        "follower lookup chunk failed — ids left unresolved"
                    );
                }
            }

            // Fixed pacing between chunks; the collaborator rate limits us.
            if index + 1 < chunk_count {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CachedFollowerCount;
    use std::sync::Mutex;

    struct FakeCache {
        entries: Vec<(String, u64, DateTime<Utc>)>,
        upserts: Mutex<Vec<(String, u64)>>,
        fail_reads: bool,
    }

    impl FakeCache {
        fn empty() -> Self {
            Self {
                entries: Vec::new(),
                upserts: Mutex::new(Vec::new()),
                fail_reads: false,
            }
        }

        fn with_entries(entries: Vec<(String, u64, DateTime<Utc>)>) -> Self {
            Self {
                entries,
                upserts: Mutex::new(Vec::new()),
                fail_reads: false,
            }
        }
    }

    impl FollowerCacheStore for FakeCache {
        async fn fresh_entries(
            &self,
            _platform: &str,
            author_ids: &[String],
            updated_after: DateTime<Utc>,
        ) -> Result<Vec<CachedFollowerCount>, IngestError> {
            if self.fail_reads {
                return Err(IngestError::Store("cache unavailable".to_string()));
            }
            Ok(self
                .entries
                .iter()
                .filter(|(id, _, updated_at)| {
                    author_ids.contains(id) && *updated_at > updated_after
                })
                .map(|(id, count, _)| CachedFollowerCount {
                    author_id: id.clone(),
                    follower_count: *count,
                })
                .collect())
        }

        async fn upsert_entry(
            &self,
            _platform: &str,
            author_id: &str,
            follower_count: u64,
        ) -> Result<(), IngestError> {
            self.upserts
                .lock()
                .unwrap()
                .push((author_id.to_owned(), follower_count));
            Ok(())
        }
    }

    struct FakeLookup {
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl FakeLookup {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    impl FollowerLookup for FakeLookup {
        async fn batch_fetch(&self, ids: &[String]) -> Result<Vec<FollowerCount>, IngestError> {
            self.calls.lock().unwrap().push(ids.to_vec());
            if self.fail {
                return Err(IngestError::Lookup("boom".to_string()));
            }
            Ok(ids
                .iter()
                .map(|id| FollowerCount {
                    id: id.clone(),
                    follower_count: 1000,
                })
                .collect())
        }
    }

    fn now() -> DateTime<Utc> {
        "2026-08-20T12:00:00Z".parse().unwrap()
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("acct_{i}")).collect()
    }

    #[tokio::test]
    async fn resolves_in_chunks_of_five() {
        let cache = FakeCache::empty();
        let lookup = FakeLookup::new();
        let resolver = FollowerCacheResolver::new(&cache, &lookup, "threads")
            .with_chunking(5, Duration::ZERO);

        let resolved = resolver.resolve(&ids(7), now()).await;

        assert_eq!(resolved.len(), 7);
        let calls = lookup.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 5);
        assert_eq!(calls[1].len(), 2);
    }

    #[tokio::test]
    async fn fresh_cache_entries_skip_the_network() {
        let cache = FakeCache::with_entries(vec![
            ("acct_0".to_string(), 42, now() - chrono::Duration::hours(1)),
            ("acct_1".to_string(), 43, now() - chrono::Duration::hours(23)),
        ]);
        let lookup = FakeLookup::new();
        let resolver = FollowerCacheResolver::new(&cache, &lookup, "threads")
            .with_chunking(5, Duration::ZERO);

        let resolved = resolver.resolve(&ids(2), now()).await;

        assert_eq!(resolved.get("acct_0"), Some(&42));
        assert_eq!(resolved.get("acct_1"), Some(&43));
        assert!(lookup.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_cache_entries_are_refreshed() {
        let cache = FakeCache::with_entries(vec![(
            "acct_0".to_string(),
            42,
            now() - chrono::Duration::hours(25),
        )]);
        let lookup = FakeLookup::new();
        let resolver = FollowerCacheResolver::new(&cache, &lookup, "threads")
            .with_chunking(5, Duration::ZERO);

        let resolved = resolver.resolve(&ids(1), now()).await;

        // Stale entry ignored; fresh value fetched and written back.
        assert_eq!(resolved.get("acct_0"), Some(&1000));
        assert_eq!(lookup.calls.lock().unwrap().len(), 1);
        let upserts = cache.upserts.lock().unwrap();
        assert_eq!(upserts.as_slice(), &[("acct_0".to_string(), 1000)]);
    }

    #[tokio::test]
    async fn failed_lookup_leaves_ids_absent() {
        let cache = FakeCache::empty();
        let mut lookup = FakeLookup::new();
        lookup.fail = true;
        let resolver = FollowerCacheResolver::new(&cache, &lookup, "threads")
            .with_chunking(5, Duration::ZERO);

        let resolved = resolver.resolve(&ids(3), now()).await;

        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn failed_cache_read_falls_back_to_lookup() {
        let mut cache = FakeCache::empty();
        cache.fail_reads = true;
        let lookup = FakeLookup::new();
        let resolver = FollowerCacheResolver::new(&cache, &lookup, "threads")
            .with_chunking(5, Duration::ZERO);

        let resolved = resolver.resolve(&ids(2), now()).await;

        assert_eq!(resolved.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_and_empty_ids_are_dropped() {
        let cache = FakeCache::empty();
        let lookup = FakeLookup::new();
        let resolver = FollowerCacheResolver::new(&cache, &lookup, "threads")
            .with_chunking(5, Duration::ZERO);

        let input = vec![
            "acct_0".to_string(),
            "acct_0".to_string(),
            String::new(),
            "acct_1".to_string(),
        ];
        let resolved = resolver.resolve(&input, now()).await;

        assert_eq!(resolved.len(), 2);
        let calls = lookup.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["acct_0".to_string(), "acct_1".to_string()]);
    }
}
