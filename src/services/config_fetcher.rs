//! Policy configuration fetcher with bounded exponential backoff.
//!
//! [`ConfigFetcher`] asks a [`RemoteConfigLoader`] for a repository's policy
//! file, retrying transient failures (timeouts and HTTP 500 responses) with a
//! delay that doubles after every attempt. Backoff waits race against the
//! caller's [`FetchContext`], so cancellation ends the fetch immediately.
//!
//! All outcomes, including failures, are returned as a [`FetchedConfig`].

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::domain::context::FetchContext;
use crate::domain::errors::{LoadError, LoadFailure};
use crate::domain::models::{FetchOutcome, FetchedConfig, PolicyConfig, RemoteDocument, RetryConfig};
use crate::domain::ports::RemoteConfigLoader;

/// HTTP status treated as a transient server-side failure.
const RETRYABLE_STATUS: u16 = 500;

/// Retry budget for transient retrieval errors.
///
/// With the defaults a fetch makes at most four attempts, waiting 1s, 2s and
/// 4s between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given budget and first delay.
    pub const fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// A policy that never retries.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.initial_backoff_ms),
        )
    }
}

/// Returns true if a load error is worth retrying.
///
/// Only timeouts and structured API errors with status 500 qualify. The
/// status is inspected only after the error has been confirmed to be an
/// API error; anything that is not one is permanent.
pub fn is_retryable(error: &LoadError) -> bool {
    if error.is_timeout() {
        return true;
    }
    error
        .as_api_error()
        .is_some_and(|api| api.status == RETRYABLE_STATUS)
}

/// Fetches and strictly decodes a repository's policy configuration.
#[derive(Debug, Clone)]
pub struct ConfigFetcher<L> {
    loader: L,
    retry: RetryPolicy,
}

impl<L: RemoteConfigLoader> ConfigFetcher<L> {
    /// Create a fetcher using the default retry policy.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the policy configuration for `owner/repository` at `branch`.
    ///
    /// Never fails: load errors, parse errors and cancellation are all
    /// reported through the returned [`FetchedConfig`].
    #[instrument(skip(self, ctx, client))]
    pub async fn config_for_repository_branch(
        &self,
        ctx: &FetchContext,
        client: &L::Client,
        owner: &str,
        repository: &str,
        branch: &str,
    ) -> FetchedConfig {
        let mut retries = 0_u32;

        loop {
            debug!(attempt = retries + 1, "loading policy configuration");

            match self
                .loader
                .load_config(ctx, client, owner, repository, branch)
                .await
            {
                Ok(document) => return assemble(document),
                Err(LoadFailure {
                    error,
                    source,
                    path,
                }) => {
                    if !is_retryable(&error) {
                        info!(error = %error, "policy load failed with permanent error");
                        return FetchedConfig::new(source, path, FetchOutcome::LoadError(error));
                    }

                    retries += 1;
                    if retries > self.retry.max_retries {
                        warn!(
                            attempts = retries,
                            error = %error,
                            "policy load failed after exhausting retries"
                        );
                        return FetchedConfig::new(source, path, FetchOutcome::LoadError(error));
                    }

                    let delay = self.retry.delay_for_retry(retries);
                    warn!(
                        attempt = retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "transient policy load error, retrying"
                    );

                    tokio::select! {
                        biased;
                        reason = ctx.done() => {
                            info!(reason = %reason, "policy load abandoned during backoff");
                            return FetchedConfig::new(
                                source,
                                path,
                                FetchOutcome::LoadError(LoadError::Context(reason)),
                            );
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}

/// Turn a successfully loaded document into a result.
fn assemble(document: RemoteDocument) -> FetchedConfig {
    let RemoteDocument {
        source,
        path,
        content,
    } = document;

    let Some(content) = content else {
        info!("no policy configuration defined");
        return FetchedConfig::absent(source, path);
    };

    match PolicyConfig::from_yaml_strict(&content) {
        Ok(config) => {
            info!(
                source = %source,
                path = %path,
                rules = config.approval_rules.len(),
                "loaded policy configuration"
            );
            FetchedConfig::new(source, path, FetchOutcome::Config(config))
        }
        Err(err) => {
            info!(source = %source, path = %path, error = %err, "policy configuration is invalid");
            FetchedConfig::new(source, path, FetchOutcome::ParseError(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ApiError, ContextError};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_delay_for_retry_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(4));
    }

    #[test]
    fn test_policy_from_config() {
        let config = RetryConfig {
            max_retries: 5,
            initial_backoff_ms: 250,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&LoadError::Timeout("read timed out".to_string())));
        assert!(is_retryable(&LoadError::Api(ApiError::new(500, "Server Error"))));
    }

    #[test]
    fn test_permanent_errors() {
        for status in [400, 401, 403, 404, 422, 502, 503, 504] {
            assert!(
                !is_retryable(&LoadError::Api(ApiError::new(status, "nope"))),
                "status {status} should not be retried"
            );
        }
        assert!(!is_retryable(&LoadError::Transport("connection refused".to_string())));
        assert!(!is_retryable(&LoadError::Unexpected("500".to_string())));
        assert!(!is_retryable(&LoadError::InvalidReference("bad".to_string())));
        assert!(!is_retryable(&LoadError::Context(ContextError::DeadlineExceeded)));
    }

    #[test]
    fn test_assemble_undefined() {
        let fc = assemble(RemoteDocument::undefined());
        assert!(fc.is_absent());
    }

    #[test]
    fn test_assemble_valid() {
        let doc = RemoteDocument::found(
            "acme/widgets@main",
            ".policy.yml",
            b"approval_rules:\n  - name: r\n".to_vec(),
        );
        let fc = assemble(doc);
        assert_eq!(fc.config().map(|c| c.approval_rules.len()), Some(1));
        assert_eq!(fc.source(), "acme/widgets@main");
    }

    #[test]
    fn test_assemble_invalid() {
        let doc = RemoteDocument::found("acme/widgets@main", ".policy.yml", b"bogus: 1\n".to_vec());
        let fc = assemble(doc);
        assert!(fc.parse_error().is_some());
        assert!(fc.config().is_none());
        assert_eq!(fc.path(), ".policy.yml");
    }
}
