use crate::api::{RedditApiClient, SubmittedPost, MAX_PAGE_SIZE, REDDIT_API_BASE};
use crate::auth::{exchange_refresh_token, RedditCredentials, RedditToken, REDDIT_TOKEN_URL};
use crate::comments::{CommentForest, PendingStub};
use tokio::sync::RwLock;
use tracing::{debug, info};
use verdict_core::{CoreError, ExpansionLimit, Thread, ThreadHandle, ThreadSource};

#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            token_url: REDDIT_TOKEN_URL.to_string(),
            api_base: REDDIT_API_BASE.to_string(),
        }
    }
}

/// An authenticated Reddit connection. The access token is renewed from the
/// refresh token whenever it is about to expire.
#[derive(Debug)]
pub struct RedditSession {
    api: RedditApiClient,
    credentials: RedditCredentials,
    endpoints: RedditEndpoints,
    token: RwLock<RedditToken>,
}

impl RedditSession {
    pub async fn connect(credentials: RedditCredentials) -> Result<Self, CoreError> {
        Self::connect_to(credentials, RedditEndpoints::default()).await
    }

    pub async fn connect_to(
        credentials: RedditCredentials,
        endpoints: RedditEndpoints,
    ) -> Result<Self, CoreError> {
        let api =
            RedditApiClient::with_base_url(credentials.user_agent.clone(), &endpoints.api_base)?;
        let token =
            exchange_refresh_token(api.http_client(), &endpoints.token_url, &credentials).await?;
        info!("Connected to Reddit");

        Ok(Self {
            api,
            credentials,
            endpoints,
            token: RwLock::new(token),
        })
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        {
            let token = self.token.read().await;
            if !token.is_expired() {
                return Ok(token.access_token.secret().clone());
            }
        }

        let mut token = self.token.write().await;
        if token.is_expired() {
            debug!("Access token expired, refreshing");
            *token = exchange_refresh_token(
                self.api.http_client(),
                &self.endpoints.token_url,
                &self.credentials,
            )
            .await?;
        }
        Ok(token.access_token.secret().clone())
    }

    /// Uploads `bytes` and posts them to `subreddit` as an image submission.
    pub async fn submit_image(
        &self,
        subreddit: &str,
        title: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<SubmittedPost, CoreError> {
        let access_token = self.access_token().await?;
        let mime_type = mime_type_for(file_name);

        let lease = self
            .api
            .request_media_lease(&access_token, file_name, mime_type)
            .await?;
        let image_url = self
            .api
            .upload_media(&lease, file_name, mime_type, bytes)
            .await?;
        let post = self
            .api
            .submit_image(&access_token, subreddit, title, &image_url)
            .await?;

        info!("Submitted image post to r/{}", subreddit);
        Ok(post)
    }
}

fn mime_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

impl ThreadSource for RedditSession {
    async fn list_hot(&self, channel: &str, limit: u32) -> Result<Vec<ThreadHandle>, CoreError> {
        let access_token = self.access_token().await?;
        let wanted = limit as usize;
        let mut handles = Vec::with_capacity(wanted);
        let mut after: Option<String> = None;

        while handles.len() < wanted {
            let listing = self
                .api
                .get_hot_posts(
                    &access_token,
                    channel,
                    wanted - handles.len(),
                    after.as_deref(),
                )
                .await?;

            let page_len = listing.data.children.len();
            handles.extend(listing.data.children.into_iter().map(|child| ThreadHandle {
                id: child.data.id,
                title: child.data.title,
            }));

            after = listing.data.after;
            if page_len == 0 || after.is_none() {
                break;
            }
        }

        handles.truncate(wanted);
        Ok(handles)
    }

    async fn expand_replies(
        &self,
        thread: &ThreadHandle,
        expansion: ExpansionLimit,
    ) -> Result<Thread, CoreError> {
        let access_token = self.access_token().await?;
        let mut forest = CommentForest::new(&thread.id);

        let listing = self.api.get_comments(&access_token, &thread.id, None).await?;
        forest.insert_all(listing.data.children);

        let mut rounds = 0;
        while forest.has_pending() && expansion.allows(rounds) {
            let access_token = self.access_token().await?;
            let mut ids = Vec::new();

            for stub in forest.take_pending() {
                match stub {
                    PendingStub::Children(children) => ids.extend(children),
                    PendingStub::Continuation(parent) => {
                        let focus = parent.trim_start_matches("t1_");
                        let subtree = self
                            .api
                            .get_comments(&access_token, &thread.id, Some(focus))
                            .await?;
                        forest.insert_all(subtree.data.children);
                    }
                }
            }

            let link_fullname = forest.link_fullname().to_string();
            for batch in ids.chunks(MAX_PAGE_SIZE) {
                let things = self
                    .api
                    .get_more_children(&access_token, &link_fullname, batch)
                    .await?;
                forest.insert_all(things);
            }

            rounds += 1;
            debug!(
                "Thread {} expansion round {} done, {} comments loaded",
                thread.id,
                rounds,
                forest.comment_count()
            );
        }

        Ok(forest.into_thread(thread.title.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("top_phrases_combined.png"), "image/png");
        assert_eq!(mime_type_for("chart.JPG"), "image/jpeg");
        assert_eq!(mime_type_for("chart.gif"), "image/gif");
        assert_eq!(mime_type_for("chart"), "image/png");
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = RedditEndpoints::default();
        assert_eq!(
            endpoints.token_url,
            "https://www.reddit.com/api/v1/access_token"
        );
        assert_eq!(endpoints.api_base, "https://oauth.reddit.com");
    }
}
