use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("follower lookup error: {0}")]
    Lookup(String),

    #[error("relevance classifier error: {0}")]
    Classifier(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}
