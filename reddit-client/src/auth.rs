use oauth2::{AccessToken, ClientId, ClientSecret, RefreshToken};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};
use verdict_core::{CoreError, RedditApiError};

pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Script-app credentials. Secrets are redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub refresh_token: RefreshToken,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn new(
        client_id: String,
        client_secret: String,
        refresh_token: String,
        user_agent: String,
    ) -> Self {
        Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            refresh_token: RefreshToken::new(refresh_token),
            user_agent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: AccessToken,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Reddit answers a refused grant with `200 {"error": "invalid_grant"}` as
/// often as with a 4xx, so both shapes are accepted.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    #[serde(default)]
    scope: String,
    error: Option<String>,
}

/// Trades the long-lived refresh token for a short-lived access token.
pub async fn exchange_refresh_token(
    http_client: &Client,
    token_url: &str,
    credentials: &RedditCredentials,
) -> Result<RedditToken, CoreError> {
    debug!("Requesting access token from {}", token_url);

    let response = http_client
        .post(token_url)
        .basic_auth(
            credentials.client_id.as_str(),
            Some(credentials.client_secret.secret()),
        )
        .header("User-Agent", &credentials.user_agent)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.secret().as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        error!("Failed to get access token, status {}", status);
        return Err(RedditApiError::AuthenticationFailed {
            reason: format!("Failed to get access token, response: {}", body),
        }
        .into());
    }

    let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        error!("Unreadable token response: {}", e);
        RedditApiError::InvalidResponse {
            details: "Failed to parse access token response".to_string(),
        }
    })?;

    if let Some(reason) = parsed.error {
        return Err(RedditApiError::AuthenticationFailed { reason }.into());
    }

    let access_token = parsed
        .access_token
        .ok_or_else(|| RedditApiError::AuthenticationFailed {
            reason: "Token response did not contain an access token".to_string(),
        })?;

    let expires_in = Duration::from_secs(parsed.expires_in.unwrap_or(3600));
    info!("Obtained Reddit access token valid for {:?}", expires_in);

    Ok(RedditToken {
        access_token: AccessToken::new(access_token),
        expires_at: SystemTime::now() + expires_in,
        scope: parsed.scope.split_whitespace().map(str::to_string).collect(),
    })
}
