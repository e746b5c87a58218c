//! Cancellation-aware execution context for fetch operations.
//!
//! A [`FetchContext`] carries a cancellation signal and an optional deadline.
//! Long-running steps (HTTP requests, backoff waits) race their own work
//! against [`FetchContext::done`] so a caller can abandon a fetch at any
//! suspension point.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::errors::ContextError;

/// Execution context shared by one fetch call and everything it awaits.
#[derive(Debug, Clone)]
pub struct FetchContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl FetchContext {
    /// Create a context with no deadline that ends only when canceled.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Create a context that ends `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_at(Instant::now() + timeout)
    }

    /// Create a context that ends at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::new().deadline_at(deadline)
    }

    /// Return a copy of this context with an earlier-or-equal deadline.
    ///
    /// A deadline later than the current one is ignored.
    #[must_use]
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        });
        self
    }

    /// Derive a child context.
    ///
    /// Canceling the parent cancels the child; canceling the child leaves
    /// the parent running. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context ended, or `None` while it is still live.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context ends, yielding the reason.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => ContextError::Canceled,
                () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}
