use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of the external follower-lookup service. When unset,
    /// follower counts are treated as unknown and account scoring falls
    /// back to the legacy engagement formula.
    pub follower_lookup_url: Option<String>,
    /// Base URL of the AI relevance classifier. When unset, the legacy
    /// workspace topic filter is skipped entirely.
    pub classifier_url: Option<String>,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    /// How many author ids to resolve per lookup call.
    pub lookup_chunk_size: usize,
    /// Fixed pause between lookup chunks, respecting the collaborator's
    /// rate limit.
    pub lookup_chunk_delay_ms: u64,
    /// Follower cache entries older than this are refreshed before use.
    pub follower_cache_ttl_hours: i64,
    pub ingest_max_concurrent_posts: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("follower_lookup_url", &self.follower_lookup_url)
            .field("classifier_url", &self.classifier_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("lookup_chunk_size", &self.lookup_chunk_size)
            .field("lookup_chunk_delay_ms", &self.lookup_chunk_delay_ms)
            .field("follower_cache_ttl_hours", &self.follower_cache_ttl_hours)
            .field(
                "ingest_max_concurrent_posts",
                &self.ingest_max_concurrent_posts,
            )
            .finish()
    }
}
