//! AI-backed topic relevance classification.
//!
//! The classifier is an injected capability, not ambient global state. The
//! pipeline fails open on classifier errors: an outage must not silently
//! starve the review queue, so errored checks are logged and treated as
//! relevant. See `pipeline.rs` for the fail-open handling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Decides whether post content is relevant to a workspace topic filter.
pub trait RelevanceClassifier {
    fn is_relevant(
        &self,
        content: &str,
        topic: &str,
    ) -> impl std::future::Future<Output = Result<bool, IngestError>> + Send;
}

/// Classifier used when no classifier endpoint is configured: everything is
/// relevant.
pub struct AlwaysRelevant;

impl RelevanceClassifier for AlwaysRelevant {
    async fn is_relevant(&self, _content: &str, _topic: &str) -> Result<bool, IngestError> {
        Ok(true)
    }
}

/// HTTP implementation of [`RelevanceClassifier`].
///
/// POSTs `{"content": ..., "topic": ...}` to `{base_url}/classify/relevance`
/// and expects `{"relevant": bool}`.
pub struct HttpRelevanceClassifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    content: &'a str,
    topic: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    relevant: bool,
}

impl HttpRelevanceClassifier {
    /// Creates a classifier client with the given timeout and `User-Agent`.
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
            url: format!("{}/classify/relevance", base_url.trim_end_matches('/')),
        })
    }
}

impl RelevanceClassifier for HttpRelevanceClassifier {
    async fn is_relevant(&self, content: &str, topic: &str) -> Result<bool, IngestError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { content, topic })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Classifier(format!("classifier response parse error: {e}")))?;
        Ok(body.relevant)
    }
}
