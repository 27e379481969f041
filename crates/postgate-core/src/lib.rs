//! Core types and configuration for postgate.
//!
//! Holds the domain model shared across crates (scraped posts, partially
//! resolved metrics, rejection reasons, workspace scoring settings), the
//! env-driven application config, and the YAML source definitions.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod post;
pub mod sources;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use post::{
    MediaItem, PartialMetrics, RawPost, RejectionReason, WorkspaceScoringSettings,
    DEFAULT_HOT_SCORE_THRESHOLD,
};
pub use sources::{load_sources, SourceConfig, SourceType, SourcesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
