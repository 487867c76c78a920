#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Upstream returned HTTP {status} for {url}.")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("Failed to parse syndication feed: {message}")]
    FeedParseFailed { message: String },

    #[error("Invalid data from API: missing field `{field}`.")]
    MissingField { field: String },

    #[error("Invalid source ID: {source_id}.")]
    InvalidSourceId { source_id: String },

    #[error("Feed API error: {message}")]
    ApiError { message: String },
}

impl From<wreq::Error> for FeedError {
    fn from(e: wreq::Error) -> Self {
        FeedError::RequestFailed(Box::new(e))
    }
}
