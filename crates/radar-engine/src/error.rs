use radar_providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RadarError {
    /// The caller broke the run contract (competitor count, empty identifiers).
    #[error("invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("insight client setup failed: {0}")]
    Insight(#[from] InsightError),
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("missing credential: {0} is not configured")]
    MissingCredential(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("completion response had no message content")]
    EmptyCompletion,

    #[error("completion was not valid insight JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
