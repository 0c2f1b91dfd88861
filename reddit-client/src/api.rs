use crate::comments::{CommentListing, CommentThing};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;
use verdict_core::{CoreError, RedditApiError};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Largest page Reddit serves for listings and `morechildren`.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub stickied: bool,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: JsonEnvelope<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<CommentThing>,
}

/// Reddit's `api_type=json` wrapper: errors are `[code, message, field]` triples.
#[derive(Debug, Deserialize)]
struct JsonEnvelope<T> {
    #[serde(default)]
    errors: Vec<Vec<serde_json::Value>>,
    data: Option<T>,
}

fn describe_errors(errors: &[Vec<serde_json::Value>]) -> String {
    errors
        .iter()
        .map(|e| {
            e.iter()
                .filter_map(|part| part.as_str())
                .collect::<Vec<_>>()
                .join(": ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaLease {
    pub args: MediaUploadArgs,
    pub asset: MediaAsset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaUploadArgs {
    /// Protocol-relative bucket URL, e.g. `//reddit-uploaded-media.s3-accelerate.amazonaws.com`.
    pub action: String,
    pub fields: Vec<MediaUploadField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaUploadField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaAsset {
    pub asset_id: String,
    pub websocket_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    json: JsonEnvelope<SubmittedPost>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmittedPost {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub user_submitted_page: Option<String>,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    api_base: String,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        Self::with_base_url(user_agent, REDDIT_API_BASE)
    }

    pub fn with_base_url(user_agent: String, api_base: &str) -> Result<Self, CoreError> {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth()));

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter,
            api_base: api_base.trim_end_matches('/').to_string(),
            user_agent,
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.api_base, endpoint);

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }
        if let Some(fields) = form {
            request_builder = request_builder.form(fields);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        self.observe_rate_limit_headers(&response).await;

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let error = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => RedditApiError::InvalidResponse {
                details: "Resource not found".to_string(),
            },
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", code, endpoint),
            },
        };
        Err(CoreError::RedditApi(error))
    }

    async fn observe_rate_limit_headers(&self, response: &Response) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
        };

        if let (Some(remaining), Some(reset)) =
            (header("x-ratelimit-remaining"), header("x-ratelimit-reset"))
        {
            self.rate_limiter
                .record_server_budget(remaining, Duration::from_secs_f64(reset.max(0.0)))
                .await;
        }
    }

    pub async fn get_hot_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/hot", subreddit);
        let limit_str = limit.min(MAX_PAGE_SIZE).to_string();
        let mut params = vec![("limit", limit_str.as_str()), ("raw_json", "1")];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(
                Method::GET,
                &endpoint,
                access_token,
                Some(params.as_slice()),
                None,
            )
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::InvalidResponse { .. }) => {
                    CoreError::RedditApi(RedditApiError::SubredditNotFound {
                        subreddit: subreddit.to_string(),
                    })
                }
                other => other,
            })?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        debug!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// Comment forest of a post. With `focus`, only the subtree rooted at that
    /// comment (by short id) is returned.
    pub async fn get_comments(
        &self,
        access_token: &str,
        post_id: &str,
        focus: Option<&str>,
    ) -> Result<CommentListing, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let mut params = vec![("raw_json", "1")];
        if let Some(comment) = focus {
            params.push(("comment", comment));
        }

        let response = self
            .make_request(
                Method::GET,
                &endpoint,
                access_token,
                Some(params.as_slice()),
                None,
            )
            .await
            .map_err(|e| match e {
                CoreError::RedditApi(RedditApiError::InvalidResponse { .. }) => {
                    CoreError::RedditApi(RedditApiError::PostNotFound {
                        post_id: post_id.to_string(),
                    })
                }
                other => other,
            })?;

        let (_post, comments): (serde_json::Value, CommentListing) =
            response.json().await.map_err(|e| {
                error!("Failed to parse comments: {}", e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("Failed to parse comments for post {}", post_id),
                })
            })?;

        Ok(comments)
    }

    pub async fn get_more_children(
        &self,
        access_token: &str,
        link_fullname: &str,
        children: &[String],
    ) -> Result<Vec<CommentThing>, CoreError> {
        let ids = children.join(",");
        let params = [
            ("link_id", link_fullname),
            ("children", ids.as_str()),
            ("api_type", "json"),
            ("raw_json", "1"),
        ];

        let response = self
            .make_request(
                Method::GET,
                "/api/morechildren",
                access_token,
                Some(params.as_slice()),
                None,
            )
            .await?;

        let parsed: MoreChildrenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse morechildren response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse more comments for {}", link_fullname),
            })
        })?;

        if !parsed.json.errors.is_empty() {
            return Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: describe_errors(&parsed.json.errors),
            }));
        }

        let things = parsed.json.data.map(|d| d.things).unwrap_or_default();
        debug!("Loaded {} more things for {}", things.len(), link_fullname);
        Ok(things)
    }

    pub async fn request_media_lease(
        &self,
        access_token: &str,
        file_name: &str,
        mime_type: &str,
    ) -> Result<MediaLease, CoreError> {
        let form = [("filepath", file_name), ("mimetype", mime_type)];
        let response = self
            .make_request(
                Method::POST,
                "/api/media/asset.json",
                access_token,
                None,
                Some(form.as_slice()),
            )
            .await?;

        response.json().await.map_err(|e| {
            error!("Failed to parse media lease: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse media upload lease".to_string(),
            })
        })
    }

    /// Uploads to the bucket named by the lease and returns the media URL.
    pub async fn upload_media(
        &self,
        lease: &MediaLease,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, CoreError> {
        let action = if lease.args.action.starts_with("//") {
            format!("https:{}", lease.args.action)
        } else {
            lease.args.action.clone()
        };
        let upload_url = Url::parse(&action).map_err(|e| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Invalid upload URL {}: {}", action, e),
            })
        })?;

        let mut form = Form::new();
        let mut key = None;
        for field in &lease.args.fields {
            if field.name == "key" {
                key = Some(field.value.clone());
            }
            form = form.text(field.name.clone(), field.value.clone());
        }
        let key = key.ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Upload lease has no key field".to_string(),
            })
        })?;

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        form = form.part("file", part);

        let permit = self.rate_limiter.acquire_permit().await;
        debug!("Uploading {} after {:?}", file_name, permit.queue_wait_time);
        let response = self
            .http_client
            .post(upload_url.clone())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Media upload failed with {}: {}", status, body);
            return Err(CoreError::RedditApi(RedditApiError::SubmissionRejected {
                details: format!("media upload returned {}", status),
            }));
        }

        let media_url = format!("{}/{}", upload_url.as_str().trim_end_matches('/'), key);
        info!("Uploaded {} as asset {}", file_name, lease.asset.asset_id);
        Ok(media_url)
    }

    pub async fn submit_image(
        &self,
        access_token: &str,
        subreddit: &str,
        title: &str,
        image_url: &str,
    ) -> Result<SubmittedPost, CoreError> {
        let form = [
            ("sr", subreddit),
            ("kind", "image"),
            ("title", title),
            ("url", image_url),
            ("api_type", "json"),
            ("resubmit", "true"),
            ("sendreplies", "true"),
        ];

        let response = self
            .make_request(
                Method::POST,
                "/api/submit",
                access_token,
                None,
                Some(form.as_slice()),
            )
            .await?;

        let parsed: SubmitResponse = response.json().await.map_err(|e| {
            error!("Failed to parse submit response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse submission response".to_string(),
            })
        })?;

        if !parsed.json.errors.is_empty() {
            return Err(CoreError::RedditApi(RedditApiError::SubmissionRejected {
                details: describe_errors(&parsed.json.errors),
            }));
        }

        Ok(parsed.json.data.unwrap_or_default())
    }

    pub async fn get_rate_limit_status(&self) -> crate::rate_limiter::RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }
}
