//! Common test utilities for integration tests
//!
//! Provides a scripted [`RemoteConfigLoader`] fake and shared helpers used
//! across multiple integration test files.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use policy_fetcher::domain::context::FetchContext;
use policy_fetcher::domain::errors::{ApiError, LoadError, LoadFailure};
use policy_fetcher::domain::models::RemoteDocument;
use policy_fetcher::domain::ports::RemoteConfigLoader;

pub const SOURCE: &str = "acme/widgets@main";
pub const PATH: &str = ".policy.yml";

pub type LoadResult = Result<RemoteDocument, LoadFailure>;

/// Loader that replays a fixed script of results.
///
/// Once the script runs out, the last entry is repeated. Every call records
/// the (possibly paused) tokio clock so tests can check backoff spacing.
#[derive(Clone)]
pub struct ScriptedLoader {
    script: Arc<Mutex<VecDeque<LoadResult>>>,
    last: Arc<Mutex<Option<LoadResult>>>,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedLoader {
    pub fn new(script: Vec<LoadResult>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A loader that returns `result` on every call.
    pub fn always(result: LoadResult) -> Self {
        Self::new(vec![result])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    /// Gaps between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.call_times()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

#[async_trait]
impl RemoteConfigLoader for ScriptedLoader {
    type Client = ();

    async fn load_config(
        &self,
        _ctx: &FetchContext,
        _client: &(),
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<RemoteDocument, LoadFailure> {
        self.calls.lock().unwrap().push(Instant::now());

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(result) = next {
            *last = Some(result);
        }
        last.clone().unwrap_or_else(|| Ok(RemoteDocument::undefined()))
    }
}

/// A found document at the standard test location.
pub fn document(content: &str) -> LoadResult {
    Ok(RemoteDocument::found(SOURCE, PATH, content.as_bytes().to_vec()))
}

/// A load failure at the standard test location.
pub fn failure(error: LoadError) -> LoadResult {
    Err(LoadFailure::from(error).at(SOURCE, PATH))
}

pub fn timeout() -> LoadResult {
    failure(LoadError::Timeout("operation timed out".to_string()))
}

pub fn api_status(status: u16) -> LoadResult {
    failure(LoadError::Api(ApiError::new(status, "Server Error")))
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
