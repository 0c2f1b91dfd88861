use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Harvest(e) => {
                error!("Harvest error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Harvest(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Chart { message } => format!("Could not draw the chart: {}", message),
            CoreError::Io(e) => format!("File operation failed: {}", e),
            CoreError::Network(_) => {
                "Could not reach Reddit. Check the network connection.".to_string()
            }
            CoreError::EmptyResultSet { channel } => format!(
                "No usable comments were found in r/{}. Nothing was posted.",
                channel
            ),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Harvest(_) => "HARVEST".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Chart { .. } => "CHART".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::EmptyResultSet { .. } => "EMPTY_RESULT_SET".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit rejected the app credentials or refresh token.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Reddit denied access to {}. The subreddit may be private or quarantined.",
                resource
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::PostNotFound { .. } => {
                "The requested post could not be found.".to_string()
            }
            RedditApiError::InvalidToken => {
                "Reddit no longer accepts the access token. Check the refresh token.".to_string()
            }
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out.".to_string()
            }
            RedditApiError::SubmissionRejected { details } => {
                format!("Reddit rejected the post: {}", details)
            }
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND".to_string(),
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::SubmissionRejected { .. } => "REDDIT_SUBMISSION_REJECTED".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for HarvestError {
    fn log_error(&self) -> &Self {
        error!("HarvestError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("HarvestError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            HarvestError::InvalidRequest { reason } => {
                format!("The harvest request is invalid: {}", reason)
            }
            HarvestError::Auth(e) => e.user_friendly_message(),
            HarvestError::Retrieval { channel, source } => format!(
                "Could not read threads from r/{}: {}",
                channel,
                source.user_friendly_message()
            ),
        }
    }

    fn error_code(&self) -> String {
        match self {
            HarvestError::InvalidRequest { .. } => "HARVEST_INVALID_REQUEST".to_string(),
            HarvestError::Auth(_) => "HARVEST_AUTH_FAILED".to_string(),
            HarvestError::Retrieval { .. } => "HARVEST_RETRIEVAL_FAILED".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' was not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required setting '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Setting '{}' has an invalid value: {}", field, value)
            }
            ConfigError::Parse(e) => format!("Configuration file could not be parsed: {}", e),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE".to_string(),
        }
    }
}
