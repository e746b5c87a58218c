//! Integration tests for the GitHub-backed policy loader
//!
//! Test coverage:
//! - Raw file retrieval with auth and media type headers
//! - Missing files, multiple candidate paths and the default repository
//! - Remote reference following
//! - Retry of HTTP 500 responses end to end, and terminal handling of others
//! - Structured API error bodies

mod common;

use std::time::Duration;

use mockito::{Matcher, Server, ServerGuard};
use policy_fetcher::adapters::github::{GitHubClient, GitHubConfigLoader};
use policy_fetcher::domain::context::FetchContext;
use policy_fetcher::domain::errors::{ContextError, LoadError};
use policy_fetcher::domain::models::{FetchedConfig, GitHubConfig, LoaderConfig};
use policy_fetcher::services::{ConfigFetcher, RetryPolicy};

const POLICY: &str = "policy:\n  approval: [review]\napproval_rules:\n  - name: review\n    requires:\n      count: 1\n";

fn client_for(server: &ServerGuard) -> GitHubClient {
    GitHubClient::from_config(&GitHubConfig {
        api_url: server.url(),
        token: Some("test-token".to_string()),
        timeout_secs: 5,
        ..GitHubConfig::default()
    })
    .expect("Failed to create client")
}

async fn fetch_with(server: &ServerGuard, loader: LoaderConfig, retry: RetryPolicy) -> FetchedConfig {
    ConfigFetcher::new(GitHubConfigLoader::new(loader))
        .with_retry_policy(retry)
        .config_for_repository_branch(
            &FetchContext::new(),
            &client_for(server),
            "acme",
            "widgets",
            "main",
        )
        .await
}

async fn fetch(server: &ServerGuard) -> FetchedConfig {
    fetch_with(server, LoaderConfig::default(), RetryPolicy::none()).await
}

fn raw_ref(git_ref: &str) -> Matcher {
    Matcher::UrlEncoded("ref".to_string(), git_ref.to_string())
}

#[tokio::test]
async fn test_fetch_policy_file() {
    common::setup_test_logging();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(raw_ref("main"))
        .match_header("accept", "application/vnd.github.raw")
        .match_header("authorization", "Bearer test-token")
        .match_header("x-github-api-version", "2022-11-28")
        .with_status(200)
        .with_body(POLICY)
        .create_async()
        .await;

    let result = fetch(&server).await;

    mock.assert_async().await;
    let config = result.config().expect("policy should load");
    assert_eq!(config.approval_rules[0].name, "review");
    assert_eq!(result.source(), "acme/widgets@main");
    assert_eq!(result.path(), ".policy.yml");
}

#[tokio::test]
async fn test_missing_file_is_absent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(raw_ref("main"))
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .expect(1)
        .create_async()
        .await;

    let result = fetch(&server).await;

    mock.assert_async().await;
    assert!(result.is_absent());
    assert!(!result.is_error());
    assert_eq!(result.source(), "acme/widgets@main");
    assert_eq!(result.path(), ".policy.yml");
}

#[tokio::test]
async fn test_candidate_paths_in_order() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/repos/acme/widgets/contents/.github/policy.yml")
        .match_query(raw_ref("main"))
        .with_status(200)
        .with_body(POLICY)
        .create_async()
        .await;

    let loader = LoaderConfig {
        paths: vec![".policy.yml".to_string(), ".github/policy.yml".to_string()],
        ..LoaderConfig::default()
    };
    let result = fetch_with(&server, loader, RetryPolicy::none()).await;

    first.assert_async().await;
    second.assert_async().await;
    assert!(result.config().is_some());
    assert_eq!(result.path(), ".github/policy.yml");
}

#[tokio::test]
async fn test_follow_remote_reference() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("remote: acme/policies\npath: shared/widgets.yml\nref: v1\n")
        .create_async()
        .await;
    let remote = server
        .mock("GET", "/repos/acme/policies/contents/shared/widgets.yml")
        .match_query(raw_ref("v1"))
        .with_status(200)
        .with_body(POLICY)
        .create_async()
        .await;

    let result = fetch(&server).await;

    remote.assert_async().await;
    assert!(result.config().is_some());
    assert_eq!(result.source(), "acme/policies@v1");
    assert_eq!(result.path(), "shared/widgets.yml");
}

#[tokio::test]
async fn test_remote_reference_uses_default_branch() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("remote: acme/policies\n")
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/policies")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"full_name":"acme/policies","default_branch":"trunk"}"#)
        .create_async()
        .await;
    let remote = server
        .mock("GET", "/repos/acme/policies/contents/.policy.yml")
        .match_query(raw_ref("trunk"))
        .with_status(200)
        .with_body(POLICY)
        .create_async()
        .await;

    let result = fetch(&server).await;

    remote.assert_async().await;
    assert_eq!(result.source(), "acme/policies@trunk");
    assert_eq!(result.path(), ".policy.yml");
    assert!(result.config().is_some());
}

#[tokio::test]
async fn test_remote_reference_to_missing_file() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("remote: acme/policies\nref: main\n")
        .create_async()
        .await;
    let remote = server
        .mock("GET", "/repos/acme/policies/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let result = fetch_with(
        &server,
        LoaderConfig::default(),
        RetryPolicy::new(3, Duration::from_millis(10)),
    )
    .await;

    remote.assert_async().await;
    assert!(matches!(result.load_error(), Some(LoadError::InvalidReference(_))));
    assert_eq!(result.source(), "acme/policies@main");
}

#[tokio::test]
async fn test_default_repository_fallback() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/.github")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"full_name":"acme/.github","default_branch":"main"}"#)
        .create_async()
        .await;
    let fallback = server
        .mock("GET", "/repos/acme/.github/contents/policy.yml")
        .match_query(raw_ref("main"))
        .with_status(200)
        .with_body(POLICY)
        .create_async()
        .await;

    let loader = LoaderConfig {
        default_repository: Some(".github".to_string()),
        ..LoaderConfig::default()
    };
    let result = fetch_with(&server, loader, RetryPolicy::none()).await;

    fallback.assert_async().await;
    assert!(result.config().is_some());
    assert_eq!(result.source(), "acme/.github@main");
    assert_eq!(result.path(), "policy.yml");
}

#[tokio::test]
async fn test_missing_default_repository_is_absent() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/.github")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let loader = LoaderConfig {
        default_repository: Some(".github".to_string()),
        ..LoaderConfig::default()
    };
    let result = fetch_with(&server, loader, RetryPolicy::none()).await;

    assert!(result.is_absent());
    assert_eq!(result.source(), "acme/widgets@main");
}

#[tokio::test]
async fn test_default_repository_lookup_failure_keeps_location() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/.github")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Server Error"}"#)
        .create_async()
        .await;

    let loader = LoaderConfig {
        default_repository: Some(".github".to_string()),
        ..LoaderConfig::default()
    };
    let result = fetch_with(&server, loader, RetryPolicy::none()).await;

    assert_eq!(
        result.load_error().and_then(LoadError::as_api_error).map(|e| e.status),
        Some(500)
    );
    assert_eq!(result.source(), "acme/.github");
    assert_eq!(result.path(), "policy.yml");
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Server Error"}"#)
        .expect(3)
        .create_async()
        .await;

    let result = fetch_with(
        &server,
        LoaderConfig::default(),
        RetryPolicy::new(2, Duration::from_millis(10)),
    )
    .await;

    mock.assert_async().await;
    let api = result
        .load_error()
        .and_then(LoadError::as_api_error)
        .expect("expected an API error");
    assert_eq!(api.status, 500);
    assert_eq!(api.message, "Server Error");
    assert_eq!(result.source(), "acme/widgets@main");
}

#[tokio::test]
async fn test_forbidden_is_terminal() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"message":"API rate limit exceeded","documentation_url":"https://docs.github.com/rest"}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let result = fetch_with(
        &server,
        LoaderConfig::default(),
        RetryPolicy::new(3, Duration::from_millis(10)),
    )
    .await;

    mock.assert_async().await;
    let api = result
        .load_error()
        .and_then(LoadError::as_api_error)
        .expect("expected an API error");
    assert_eq!(api.status, 403);
    assert_eq!(api.message, "API rate limit exceeded");
    assert_eq!(api.documentation_url.as_deref(), Some("https://docs.github.com/rest"));
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("Bad Gateway from upstream proxy")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .get_file(&FetchContext::new(), "acme", "widgets", ".policy.yml", Some("main"))
        .await
        .unwrap_err();

    let api = err.as_api_error().expect("expected an API error");
    assert_eq!(api.status, 502);
    assert_eq!(api.message, "Bad Gateway from upstream proxy");
}

#[tokio::test]
async fn test_directory_is_invalid_content() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json; charset=utf-8")
        .with_body("[]")
        .create_async()
        .await;

    let result = fetch(&server).await;

    assert!(matches!(
        result.load_error(),
        Some(LoadError::InvalidContent { path, .. }) if path == ".policy.yml"
    ));
}

#[tokio::test]
async fn test_canceled_context_skips_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widgets/contents/.policy.yml")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(POLICY)
        .expect(0)
        .create_async()
        .await;

    let ctx = FetchContext::new();
    ctx.cancel();
    let result = ConfigFetcher::new(GitHubConfigLoader::new(LoaderConfig::default()))
        .config_for_repository_branch(&ctx, &client_for(&server), "acme", "widgets", "main")
        .await;

    mock.assert_async().await;
    assert_eq!(
        result.load_error(),
        Some(&LoadError::Context(ContextError::Canceled))
    );
}
