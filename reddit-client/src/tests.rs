#[cfg(test)]
mod tests {
    use crate::{RedditCredentials, RedditEndpoints, RedditSession};
    use serde_json::{json, Value};
    use verdict_core::{
        harvest, CommentFilter, CoreError, ExpansionLimit, HarvestError, HarvestOutput,
        HarvestRequest, RedditApiError, ThreadHandle, ThreadSource, VerdictCategory,
        VerdictClassifier,
    };
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_credentials() -> RedditCredentials {
        RedditCredentials::new(
            "test_client_id".to_string(),
            "test_client_secret".to_string(),
            "test_refresh_token".to_string(),
            "rust:verdict-phrases:v0.1.0 (test)".to_string(),
        )
    }

    fn endpoints(server: &MockServer) -> RedditEndpoints {
        RedditEndpoints {
            token_url: format!("{}/api/v1/access_token", server.uri()),
            api_base: server.uri(),
        }
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=test_refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "test_access_token",
                "token_type": "bearer",
                "expires_in": 86400,
                "scope": "read submit"
            })))
            .mount(server)
            .await;
    }

    async fn connect(server: &MockServer) -> RedditSession {
        mount_token(server).await;
        RedditSession::connect_to(create_test_credentials(), endpoints(server))
            .await
            .expect("session should connect")
    }

    fn post(id: &str, title: &str) -> Value {
        json!({"kind": "t3", "data": {
            "id": id, "name": format!("t3_{}", id), "title": title,
            "author": "op", "subreddit": "AmItheAsshole"
        }})
    }

    fn comment(id: &str, parent: &str, author: &str, body: &str, replies: Value) -> Value {
        json!({"kind": "t1", "data": {
            "id": id, "name": format!("t1_{}", id), "parent_id": parent,
            "author": author, "body": body, "replies": replies
        }})
    }

    fn listing(children: Vec<Value>) -> Value {
        json!({"kind": "Listing", "data": {"after": null, "before": null, "children": children}})
    }

    fn comments_page(children: Vec<Value>) -> Value {
        json!([listing(vec![post("p1", "AITA for testing?")]), listing(children)])
    }

    #[tokio::test]
    async fn test_connect_exchanges_refresh_token() {
        let server = MockServer::start().await;
        let session = connect(&server).await;

        let status = session.api().get_rate_limit_status().await;
        assert_eq!(status.requests_made, 0);
    }

    #[tokio::test]
    async fn test_rejected_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"message\": \"Unauthorized\"}"))
            .mount(&server)
            .await;

        let result = RedditSession::connect_to(create_test_credentials(), endpoints(&server)).await;
        match result {
            Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })) => {
                assert!(reason.contains("Unauthorized"));
            }
            other => panic!("Expected AuthenticationFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_invalid_grant_with_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let result = RedditSession::connect_to(create_test_credentials(), endpoints(&server)).await;
        match result {
            Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })) => {
                assert_eq!(reason, "invalid_grant");
            }
            other => panic!("Expected AuthenticationFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_list_hot_follows_pagination() {
        let server = MockServer::start().await;
        let session = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/amitheasshole/hot"))
            .and(query_param("after", "t3_b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "Listing",
                "data": {"after": "t3_d", "before": null, "children": [
                    post("c", "third"), post("d", "fourth")
                ]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/amitheasshole/hot"))
            .and(header("authorization", "Bearer test_access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "Listing",
                "data": {"after": "t3_b", "before": null, "children": [
                    post("a", "first"), post("b", "second")
                ]}
            })))
            .mount(&server)
            .await;

        let handles = session.list_hot("amitheasshole", 3).await.unwrap();
        let ids: Vec<&str> = handles.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(handles[2].title, "third");
    }

    #[tokio::test]
    async fn test_status_codes_map_to_errors() {
        let server = MockServer::start().await;
        let session = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/r/private/hot"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/gone/hot"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/flaky/hot"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/busy/hot"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        assert!(matches!(
            session.list_hot("private", 5).await,
            Err(CoreError::RedditApi(RedditApiError::Forbidden { .. }))
        ));
        assert!(matches!(
            session.list_hot("gone", 5).await,
            Err(CoreError::RedditApi(RedditApiError::SubredditNotFound { .. }))
        ));
        assert!(matches!(
            session.list_hot("flaky", 5).await,
            Err(CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 }))
        ));
        assert!(matches!(
            session.list_hot("busy", 5).await,
            Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 7 }))
        ));
    }

    async fn mount_thread_with_more(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/comments/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(comments_page(vec![
                comment("c1", "t3_p1", "alice", "NTA, you did nothing wrong", json!("")),
                json!({"kind": "more", "data": {
                    "id": "c2", "parent_id": "t3_p1", "count": 2, "children": ["c2", "c3"]
                }}),
            ])))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/morechildren"))
            .and(query_param("link_id", "t3_p1"))
            .and(query_param("children", "c2,c3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "json": {"errors": [], "data": {"things": [
                    comment("c2", "t3_p1", "bob", "YTA, you are the problem", json!("")),
                    comment("c3", "t3_p1", "AutoModerator", "NTA bot reply", json!(""))
                ]}}
            })))
            .mount(server)
            .await;
    }

    fn handle() -> ThreadHandle {
        ThreadHandle {
            id: "p1".to_string(),
            title: "AITA for testing?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_expand_replies_loads_more_children() {
        let server = MockServer::start().await;
        let session = connect(&server).await;
        mount_thread_with_more(&server).await;

        let thread = session
            .expand_replies(&handle(), ExpansionLimit::Unbounded)
            .await
            .unwrap();

        let ids: Vec<&str> = thread.flatten().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(thread.title, "AITA for testing?");
    }

    #[tokio::test]
    async fn test_zero_rounds_skips_expansion() {
        let server = MockServer::start().await;
        let session = connect(&server).await;
        mount_thread_with_more(&server).await;

        let thread = session
            .expand_replies(&handle(), ExpansionLimit::Rounds(0))
            .await
            .unwrap();

        assert_eq!(thread.flatten().len(), 1);
        let received = server.received_requests().await.unwrap_or_default();
        assert!(received
            .iter()
            .all(|request| request.url.path() != "/api/morechildren"));
    }

    #[tokio::test]
    async fn test_continuation_fetches_subtree() {
        let server = MockServer::start().await;
        let session = connect(&server).await;

        Mock::given(method("GET"))
            .and(path("/comments/p1"))
            .and(query_param("comment", "c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(comments_page(vec![comment(
                "c1",
                "t3_p1",
                "alice",
                "NTA",
                listing(vec![comment("c9", "t1_c1", "zed", "deep reply", json!(""))]),
            )])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/comments/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(comments_page(vec![comment(
                "c1",
                "t3_p1",
                "alice",
                "NTA",
                listing(vec![json!({"kind": "more", "data": {
                    "id": "_", "parent_id": "t1_c1", "count": 0, "children": []
                }})]),
            )])))
            .mount(&server)
            .await;

        let thread = session
            .expand_replies(&handle(), ExpansionLimit::Rounds(1))
            .await
            .unwrap();

        assert_eq!(thread.comments.len(), 1);
        assert_eq!(thread.comments[0].replies[0].id, "c9");
    }

    #[tokio::test]
    async fn test_harvest_through_session() {
        let server = MockServer::start().await;
        let session = connect(&server).await;
        mount_thread_with_more(&server).await;
        Mock::given(method("GET"))
            .and(path("/r/amitheasshole/hot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "Listing",
                "data": {"after": null, "before": null, "children": [post("p1", "AITA for testing?")]}
            })))
            .mount(&server)
            .await;

        let request = HarvestRequest::new("amitheasshole", 1, ExpansionLimit::Unbounded);
        let filter = CommentFilter::new(["AutoModerator"]);
        let classifier = VerdictClassifier::default();
        let result = harvest(&session, &request, &filter, Some(&classifier))
            .await
            .unwrap();

        let HarvestOutput::ByVerdict(groups) = result.output else {
            panic!("Expected classified output");
        };
        assert_eq!(groups[&VerdictCategory::NotAsshole], vec!["NTA, you did nothing wrong"]);
        assert_eq!(groups[&VerdictCategory::Asshole], vec!["YTA, you are the problem"]);
    }

    #[tokio::test]
    async fn test_harvest_surfaces_revoked_token() {
        let server = MockServer::start().await;
        let session = connect(&server).await;
        Mock::given(method("GET"))
            .and(path("/r/amitheasshole/hot"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let request = HarvestRequest::new("amitheasshole", 5, ExpansionLimit::Unbounded);
        let result = harvest(&session, &request, &CommentFilter::default(), None).await;
        assert!(matches!(
            result,
            Err(HarvestError::Auth(RedditApiError::InvalidToken))
        ));
    }

    #[tokio::test]
    async fn test_submit_image_flow() {
        let server = MockServer::start().await;
        let session = connect(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/media/asset.json"))
            .and(body_string_contains("mimetype=image%2Fpng"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "args": {
                    "action": format!("{}/bucket", server.uri()),
                    "fields": [
                        {"name": "key", "value": "rte_images/abc123"},
                        {"name": "policy", "value": "opaque"}
                    ]
                },
                "asset": {"asset_id": "abc123", "websocket_url": "wss://example.invalid/ws"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bucket"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .and(body_string_contains("kind=image"))
            .and(body_string_contains("sr=dataisbeautiful"))
            .and(body_string_contains("rte_images%2Fabc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "json": {"errors": [], "data": {"user_submitted_page": "https://www.reddit.com/user/bot/submitted/"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let post = session
            .submit_image("dataisbeautiful", "Top phrases [OC]", "top_phrases.png", vec![0x89, 0x50])
            .await
            .unwrap();
        assert!(post.user_submitted_page.is_some());
    }

    #[tokio::test]
    async fn test_submit_image_rejected() {
        let server = MockServer::start().await;
        let session = connect(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/media/asset.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "args": {"action": format!("{}/bucket", server.uri()), "fields": [{"name": "key", "value": "k"}]},
                "asset": {"asset_id": "k"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bucket"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "json": {"errors": [["SUBREDDIT_NOTALLOWED", "you aren't allowed to post there.", "sr"]]}
            })))
            .mount(&server)
            .await;

        let result = session
            .submit_image("locked", "title", "chart.png", vec![1, 2, 3])
            .await;
        match result {
            Err(CoreError::RedditApi(RedditApiError::SubmissionRejected { details })) => {
                assert!(details.contains("SUBREDDIT_NOTALLOWED"));
            }
            other => panic!("Expected SubmissionRejected, got {:?}", other),
        }
    }
}
