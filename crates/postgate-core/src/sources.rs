//! Scrape-source definitions loaded from `config/sources.yaml`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How a source's posts are gated and scored.
///
/// `Account` sources are followed accounts scored on the account-trust
/// model; `Topic` sources are discovery searches scored on the tiered
/// topic model with spam filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Account,
    Topic,
}

impl SourceType {
    /// Parses a source type string; unknown values behave as `Account`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "topic" => SourceType::Topic,
            _ => SourceType::Account,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Account => write!(f, "account"),
            SourceType::Topic => write!(f, "topic"),
        }
    }
}

fn default_trust_weight() -> f64 {
    1.0
}

/// One configured scrape source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Account handle or topic query this source scrapes.
    pub handle: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Per-source engagement floor; posts below either bound are rejected.
    #[serde(default)]
    pub min_likes: u64,
    #[serde(default)]
    pub min_replies: u64,
    /// Overrides the workspace age ceiling for account sources.
    #[serde(default)]
    pub max_age_hours: Option<i64>,
    /// Final multiplier on account-mode scores. Defaults to 1.0.
    #[serde(default = "default_trust_weight")]
    pub trust_weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceConfig>,
}

impl SourcesFile {
    /// Finds a source by handle (case-insensitive).
    #[must_use]
    pub fn find(&self, handle: &str) -> Option<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.handle.eq_ignore_ascii_case(handle))
    }
}

/// Load and validate the sources configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources_file: SourcesFile = serde_yaml::from_str(&content)?;
    validate_sources(&sources_file)?;
    Ok(sources_file)
}

fn validate_sources(file: &SourcesFile) -> Result<(), ConfigError> {
    let mut seen_handles = HashSet::new();

    for source in &file.sources {
        if source.handle.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source handle must be non-empty".to_string(),
            ));
        }

        if !seen_handles.insert(source.handle.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source handle: '{}'",
                source.handle
            )));
        }

        if source.trust_weight <= 0.0 || !source.trust_weight.is_finite() {
            return Err(ConfigError::Validation(format!(
                "source '{}' has invalid trust_weight {}; must be a positive number",
                source.handle, source.trust_weight
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(handle: &str, source_type: SourceType) -> SourceConfig {
        SourceConfig {
            handle: handle.to_string(),
            source_type,
            min_likes: 0,
            min_replies: 0,
            max_age_hours: None,
            trust_weight: 1.0,
        }
    }

    #[test]
    fn source_type_parse_topic() {
        assert_eq!(SourceType::parse("topic"), SourceType::Topic);
        assert_eq!(SourceType::parse("TOPIC"), SourceType::Topic);
    }

    #[test]
    fn source_type_parse_unknown_defaults_to_account() {
        assert_eq!(SourceType::parse("account"), SourceType::Account);
        assert_eq!(SourceType::parse("whatever"), SourceType::Account);
        assert_eq!(SourceType::parse(""), SourceType::Account);
    }

    #[test]
    fn source_type_display() {
        assert_eq!(SourceType::Account.to_string(), "account");
        assert_eq!(SourceType::Topic.to_string(), "topic");
    }

    #[test]
    fn yaml_parses_with_defaults() {
        let yaml = "
sources:
  - handle: \"@daily_design\"
    type: account
  - handle: \"rust language\"
    type: topic
    min_likes: 10
    trust_weight: 0.8
";
        let file: SourcesFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.sources.len(), 2);
        assert_eq!(file.sources[0].source_type, SourceType::Account);
        assert!((file.sources[0].trust_weight - 1.0).abs() < f64::EPSILON);
        assert_eq!(file.sources[0].min_likes, 0);
        assert_eq!(file.sources[1].min_likes, 10);
        assert!((file.sources[1].trust_weight - 0.8).abs() < f64::EPSILON);
        assert!(validate_sources(&file).is_ok());
    }

    #[test]
    fn validate_rejects_empty_handle() {
        let file = SourcesFile {
            sources: vec![source("  ", SourceType::Account)],
        };
        let err = validate_sources(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_duplicate_handle_case_insensitive() {
        let file = SourcesFile {
            sources: vec![
                source("@Daily", SourceType::Account),
                source("@daily", SourceType::Topic),
            ],
        };
        let err = validate_sources(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate source handle"));
    }

    #[test]
    fn validate_rejects_non_positive_trust_weight() {
        let mut bad = source("@x", SourceType::Account);
        bad.trust_weight = 0.0;
        let file = SourcesFile { sources: vec![bad] };
        let err = validate_sources(&file).unwrap_err();
        assert!(err.to_string().contains("trust_weight"));
    }

    #[test]
    fn find_is_case_insensitive() {
        let file = SourcesFile {
            sources: vec![source("@Daily", SourceType::Account)],
        };
        assert!(file.find("@daily").is_some());
        assert!(file.find("@missing").is_none());
    }
}
