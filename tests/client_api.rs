use mockito::Matcher;

use orangered::client::{AnonymousClient, ClientError, LoginClient, OauthClient};
use orangered::models::{ListingOptions, PopularitySort, ThingId, TimeFilter, Votable, Vote};

const USER_AGENT: &str = "orangered integration tests";

#[tokio::test]
async fn frontpage_returns_submissions_in_listing_order() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"kind": "Listing", "data": {"after": "t3_b", "children": [
                {"kind": "t3", "data": {"name": "t3_a", "id": "a", "title": "first", "score": 10}},
                {"kind": "t3", "data": {"name": "t3_b", "id": "b", "title": "second", "score": 5}}
            ]}}"#,
        )
        .create_async()
        .await;

    let client = AnonymousClient::with_base_url(&server.url(), USER_AGENT);
    let submissions = client.frontpage().await.expect("frontpage failed");

    let names: Vec<&str> = submissions.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["t3_a", "t3_b"]);
    assert_eq!(submissions[0].title, "first");
    assert_eq!(submissions[0].vote_id(), "t3_a");
}

#[tokio::test]
async fn comments_endpoint_yields_a_tree() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/comments/abc/.json")
        .with_status(200)
        .with_body(
            r#"[
                {"kind": "Listing", "data": {"children": [
                    {"kind": "t3", "data": {"name": "t3_abc", "title": "the post", "selftext": "hi"}}
                ]}},
                {"kind": "Listing", "data": {"children": [
                    {"kind": "t1", "data": {
                        "name": "t1_top", "body": "top comment", "author": "alice",
                        "replies": {"kind": "Listing", "data": {"children": [
                            {"kind": "t1", "data": {"name": "t1_child", "body": "reply", "author": "bob", "replies": ""}}
                        ]}}
                    }}
                ]}}
            ]"#,
        )
        .create_async()
        .await;

    let client = AnonymousClient::with_base_url(&server.url(), USER_AGENT);
    // The t3_ prefix is accepted and stripped.
    let comments = client.comments("t3_abc").await.expect("comments failed");

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].name, "t1_top");
    assert_eq!(comments[0].author, "alice");
    assert_eq!(comments[0].replies.len(), 1);
    assert_eq!(comments[0].replies[0].name, "t1_child");
    assert!(comments[0].replies[0].replies.is_empty());
}

#[tokio::test]
async fn about_subreddit_unwraps_the_thing() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/r/rust/about.json")
        .with_status(200)
        .with_body(
            r#"{"kind": "t5", "data": {
                "display_name": "rust", "title": "The Rust Programming Language",
                "name": "t5_2s5oq", "id": "2s5oq", "subscribers": 300000
            }}"#,
        )
        .create_async()
        .await;

    let client = AnonymousClient::with_base_url(&server.url(), USER_AGENT);
    let subreddit = client.about_subreddit("rust").await.expect("about failed");
    assert_eq!(subreddit.display_name, "rust");
    assert_eq!(subreddit.name, "t5_2s5oq");
    assert_eq!(subreddit.subscribers, 300000);
}

#[tokio::test]
async fn http_error_status_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/.json")
        .with_status(503)
        .create_async()
        .await;

    let client = AnonymousClient::with_base_url(&server.url(), USER_AGENT);
    match client.frontpage().await {
        Err(ClientError::Status(status)) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected Status error, got {:?}", other.map(|v| v.len())),
    }
}

#[tokio::test]
async fn time_filter_on_rising_is_rejected_before_any_request() {
    // No mock: the request must never go out.
    let client = AnonymousClient::with_base_url("http://127.0.0.1:9", USER_AGENT);
    let options = ListingOptions {
        time: Some(TimeFilter::Week),
        ..ListingOptions::default()
    };
    match client
        .sorted_submissions(Some("rust"), PopularitySort::Rising, &options)
        .await
    {
        Err(ClientError::Api(msg)) => assert!(msg.contains("cannot sort")),
        other => panic!("expected Api error, got {:?}", other.map(|v| v.len())),
    }
}

#[tokio::test]
async fn login_captures_modhash_and_stamps_writes() {
    let mut server = mockito::Server::new_async().await;
    let _login = server
        .mock("POST", "/api/login/tester")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user".into(), "tester".into()),
            Matcher::UrlEncoded("passwd".into(), "hunter2".into()),
            Matcher::UrlEncoded("api_type".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("set-cookie", "reddit_session=abc123; Path=/; HttpOnly")
        .with_body(r#"{"json": {"errors": [], "data": {"modhash": "mh42"}}}"#)
        .create_async()
        .await;
    let _vote = server
        .mock("POST", "/api/vote")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "t3_x".into()),
            Matcher::UrlEncoded("dir".into(), "1".into()),
            Matcher::UrlEncoded("uh".into(), "mh42".into()),
        ]))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client =
        LoginClient::login_with_base_url(&server.url(), "tester", "hunter2", USER_AGENT)
            .await
            .expect("login failed");
    assert_eq!(client.modhash(), "mh42");

    let target = ThingId::new("t3_x");
    client.vote(&target, Vote::Up).await.expect("vote failed");
}

#[tokio::test]
async fn login_joins_the_error_array() {
    let mut server = mockito::Server::new_async().await;
    let _login = server
        .mock("POST", "/api/login/tester")
        .with_status(200)
        .with_body(
            r#"{"json": {"errors": [
                ["WRONG_PASSWORD", "wrong password", "passwd"],
                ["RATELIMIT", "you are doing that too much", null]
            ]}}"#,
        )
        .create_async()
        .await;

    match LoginClient::login_with_base_url(&server.url(), "tester", "nope", USER_AGENT).await {
        Err(ClientError::Api(msg)) => {
            assert_eq!(msg, "wrong password, you are doing that too much")
        }
        other => panic!("expected Api error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn password_grant_sets_the_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let token_url = format!("{}/api/v1/access_token", server.url());
    let _token = server
        .mock("POST", "/api/v1/access_token")
        .match_header("authorization", Matcher::Regex("^Basic .+".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "password".into()),
            Matcher::UrlEncoded("username".into(), "tester".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"access_token": "tok123", "token_type": "bearer", "expires_in": 3600, "scope": "identity read"}"#,
        )
        .create_async()
        .await;
    let _me = server
        .mock("GET", "/api/v1/me")
        .match_header("authorization", "Bearer tok123")
        .with_status(200)
        .with_body(r#"{"id": "abc", "name": "tester", "link_karma": 12, "comment_karma": 34}"#)
        .create_async()
        .await;

    let mut client = OauthClient::with_endpoints(&server.url(), &token_url, USER_AGENT);
    let token = client
        .login("cid", "secret", "tester", "hunter2")
        .await
        .expect("password grant failed");
    assert_eq!(token, "tok123");

    let me = client.me().await.expect("me failed");
    assert_eq!(me.name, "tester");
    assert_eq!(me.link_karma, 12);
}

#[tokio::test]
async fn token_endpoint_error_is_an_api_error() {
    let mut server = mockito::Server::new_async().await;
    let token_url = format!("{}/api/v1/access_token", server.url());
    let _token = server
        .mock("POST", "/api/v1/access_token")
        .with_status(200)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .create_async()
        .await;

    let mut client = OauthClient::with_endpoints(&server.url(), &token_url, USER_AGENT);
    match client.login("cid", "secret", "tester", "wrong").await {
        Err(ClientError::Api(msg)) => assert!(msg.contains("invalid_grant")),
        other => panic!("expected Api error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn oauth_write_surfaces_the_error_envelope() {
    let mut server = mockito::Server::new_async().await;
    let token_url = format!("{}/api/v1/access_token", server.url());
    let _vote = server
        .mock("POST", "/api/vote")
        .with_status(200)
        .with_body(r#"{"json": {"errors": [["USER_REQUIRED", "please log in", "id"]]}}"#)
        .create_async()
        .await;

    let mut client = OauthClient::with_endpoints(&server.url(), &token_url, USER_AGENT);
    client.set_access_token("tok");

    let target = ThingId::new("t1_y");
    match client.vote(&target, Vote::Down).await {
        Err(ClientError::Api(msg)) => assert_eq!(msg, "please log in"),
        other => panic!("expected Api error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn unauthenticated_oauth_call_is_a_precondition_failure() {
    let client = OauthClient::new(USER_AGENT);
    match client.my_karma().await {
        Err(ClientError::NotAuthenticated(_)) => {}
        other => panic!("expected NotAuthenticated, got {:?}", other.map(|v| v.len())),
    }
}
