//! GitHub HTTP client with rate limiting.
//!
//! Wraps the parts of the GitHub REST API v3 that the policy loader needs:
//! raw file contents and repository metadata. Every request is raced
//! against the caller's [`FetchContext`] and counted against a token-bucket
//! rate limiter so a busy process stays within the authenticated API quota.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::Mutex;

use crate::domain::context::FetchContext;
use crate::domain::errors::{ApiError, LoadError};
use crate::domain::models::GitHubConfig;

use super::models::{GitHubErrorBody, GitHubRepository};

/// Media type that makes the contents endpoint return the raw file bytes.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

/// Media type for regular JSON API responses.
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Token-bucket rate limiter.
///
/// Allows up to `capacity` requests per `window`. When the bucket is
/// exhausted, [`acquire`](RateLimiter::acquire) sleeps until the window
/// resets and a token becomes available.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens in the bucket.
    capacity: u32,
    /// Current available tokens.
    tokens: u32,
    /// Duration of the refill window.
    window: Duration,
    /// When the current window started.
    window_start: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter with the given capacity and window.
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            tokens: capacity,
            window,
            window_start: Instant::now(),
        }
    }

    /// Acquire a single token, sleeping if necessary.
    pub async fn acquire(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window {
            self.tokens = self.capacity;
            self.window_start = Instant::now();
        }

        if self.tokens > 0 {
            self.tokens -= 1;
        } else {
            let remaining = self.window.saturating_sub(elapsed);
            tracing::warn!(
                sleep_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                "GitHub rate limit reached, sleeping"
            );
            tokio::time::sleep(remaining).await;
            self.tokens = self.capacity - 1;
            self.window_start = Instant::now();
        }
    }
}

/// HTTP client for the GitHub REST API v3.
///
/// Network failures map to [`LoadError::Timeout`] or
/// [`LoadError::Transport`]; non-2xx responses map to [`LoadError::Api`].
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// The underlying HTTP client.
    http: Client,
    /// API base URL without a trailing slash.
    base_url: String,
    /// Bearer token, if authenticated.
    token: Option<String>,
    /// Sent as `User-Agent`; GitHub rejects requests without one.
    user_agent: String,
    /// Shared rate limiter.
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl GitHubClient {
    /// Build a client from configuration.
    pub fn from_config(config: &GitHubConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .context("Failed to build HTTP client")?;

        let token = config
            .token
            .as_ref()
            .filter(|token| !token.is_empty())
            .cloned();

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            user_agent: config.user_agent.clone(),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
                config.requests_per_hour,
                Duration::from_secs(3_600),
            ))),
        })
    }

    /// API base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True when requests carry a bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch the raw bytes of a file, or `None` if it does not exist.
    ///
    /// `git_ref` selects a branch, tag or commit; `None` reads the
    /// repository's default branch.
    pub async fn get_file(
        &self,
        ctx: &FetchContext,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<Vec<u8>>, LoadError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            owner,
            repo,
            path.trim_start_matches('/')
        );

        let mut request = self.request(reqwest::Method::GET, &url, RAW_MEDIA_TYPE);
        if let Some(git_ref) = git_ref.filter(|r| !r.is_empty()) {
            request = request.query(&[("ref", git_ref)]);
        }

        let response = self.send(ctx, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(ctx, response).await);
        }

        // Directories and other non-file entries come back as JSON even when
        // the raw media type is requested.
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        if is_json {
            return Err(LoadError::InvalidContent {
                path: path.to_string(),
                reason: "expected a file, found a directory or other non-file entry".to_string(),
            });
        }

        let bytes = read_body(ctx, response.bytes()).await?;
        Ok(Some(bytes.to_vec()))
    }

    /// Look up a repository's default branch, or `None` if the repository
    /// does not exist or is not visible to this client.
    pub async fn default_branch(
        &self,
        ctx: &FetchContext,
        owner: &str,
        repo: &str,
    ) -> Result<Option<String>, LoadError> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        let request = self.request(reqwest::Method::GET, &url, JSON_MEDIA_TYPE);

        let response = self.send(ctx, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(ctx, response).await);
        }

        let bytes = read_body(ctx, response.bytes()).await?;
        let repository: GitHubRepository = serde_json::from_slice(&bytes).map_err(|e| {
            LoadError::Unexpected(format!("GitHub repository response parse failed: {e}"))
        })?;
        Ok(Some(repository.default_branch))
    }

    /// Build an authorized request.
    fn request(&self, method: reqwest::Method, url: &str, accept: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", &self.user_agent);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    /// Acquire a rate-limit token and send, abandoning either step if the
    /// context ends first.
    async fn send(&self, ctx: &FetchContext, request: RequestBuilder) -> Result<Response, LoadError> {
        let send = async {
            self.rate_limiter.lock().await.acquire().await;
            request.send().await
        };

        tokio::select! {
            biased;
            reason = ctx.done() => Err(LoadError::Context(reason)),
            result = send => result.map_err(map_transport_error),
        }
    }
}

/// Read a response body, abandoning the read if the context ends first.
async fn read_body<F, B>(ctx: &FetchContext, body: F) -> Result<B, LoadError>
where
    F: std::future::Future<Output = reqwest::Result<B>>,
{
    tokio::select! {
        biased;
        reason = ctx.done() => Err(LoadError::Context(reason)),
        result = body => result.map_err(map_transport_error),
    }
}

fn map_transport_error(err: reqwest::Error) -> LoadError {
    if err.is_timeout() {
        LoadError::Timeout(err.to_string())
    } else {
        LoadError::Transport(err.to_string())
    }
}

/// Convert a non-2xx response into a structured API error.
///
/// GitHub normally answers with `{"message": ..., "documentation_url": ...}`;
/// when the body is not in that shape the raw text (or the canonical status
/// reason) becomes the message. The body read is abandoned if the context
/// ends first.
async fn api_error(ctx: &FetchContext, response: Response) -> LoadError {
    let status = response.status();
    let body = match read_body(ctx, response.text()).await {
        Ok(body) => body,
        Err(err @ LoadError::Context(_)) => return err,
        Err(_) => String::new(),
    };

    let error = match serde_json::from_str::<GitHubErrorBody>(&body) {
        Ok(parsed) => ApiError {
            status: status.as_u16(),
            message: parsed.message,
            documentation_url: parsed.documentation_url,
        },
        Err(_) if body.trim().is_empty() => ApiError::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown error"),
        ),
        Err(_) => ApiError::new(status.as_u16(), body.trim()),
    };
    LoadError::Api(error)
}
