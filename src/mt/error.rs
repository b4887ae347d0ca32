/// Error types for the Machine Translation module
#[derive(Debug, thiserror::Error)]
pub enum MtError {
    /// The service answered with a non-success HTTP status
    #[error("Translation request failed: HTTP {status}")]
    RequestFailed { status: u16 },
    /// The response body could not be decoded as JSON
    #[error("Invalid translation response: {0}")]
    InvalidResponse(String),
    /// Transport-level failure (connection, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Language code rejected before any request was made
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Provider could not be constructed
    #[error("Configuration error: {0}")]
    Config(String),
    /// Simulated or provider-specific failure
    #[error("Translation error: {0}")]
    Translation(String),
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
