use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Harvest failed: {0}")]
    Harvest(#[from] HarvestError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Chart rendering failed: {message}")]
    Chart { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No phrases left to chart for r/{channel}")]
    EmptyResultSet { channel: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Submission rejected: {details}")]
    SubmissionRejected { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

impl RedditApiError {
    /// Whether the error means the credentials or the token were refused.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken
        )
    }
}

/// Failure of a whole harvest run. A run never yields partial output.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Invalid harvest request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Authentication rejected while harvesting: {0}")]
    Auth(RedditApiError),

    #[error("Retrieval failed for r/{channel}: {source}")]
    Retrieval {
        channel: String,
        #[source]
        source: Box<CoreError>,
    },
}

impl HarvestError {
    /// Classifies a collaborator error raised while harvesting `channel`.
    pub fn from_collaborator(channel: &str, error: CoreError) -> Self {
        match error {
            CoreError::RedditApi(api_error) if api_error.is_auth_failure() => {
                HarvestError::Auth(api_error)
            }
            other => HarvestError::Retrieval {
                channel: channel.to_string(),
                source: Box::new(other),
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
