//! Domain errors for policy retrieval and decoding.

use thiserror::Error;

/// Why a [`FetchContext`](super::context::FetchContext) ended.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The context was canceled explicitly.
    #[error("context canceled")]
    Canceled,

    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Structured error returned by the hosting service's API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("API returned {status}: {message}")]
pub struct ApiError {
    /// HTTP status code of the response.
    pub status: u16,
    /// Human-readable message from the error body.
    pub message: String,
    /// Link to the service's documentation for this error, when provided.
    pub documentation_url: Option<String>,
}

impl ApiError {
    /// Build an error with no documentation link.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            documentation_url: None,
        }
    }
}

/// Errors raised while retrieving a configuration document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The request did not complete in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The API answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request failed below the HTTP layer.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The API returned something other than a file.
    #[error("Invalid content at {path}: {reason}")]
    InvalidContent {
        /// Path that was requested.
        path: String,
        /// What was found instead of a file.
        reason: String,
    },

    /// A remote reference could not be resolved.
    #[error("Invalid remote reference: {0}")]
    InvalidReference(String),

    /// The fetch context ended.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Any other failure, such as an unreadable API payload.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl LoadError {
    /// Returns true if this error represents a timed-out request.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// View this error as a structured API error, if it is one.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// A loader failure together with whatever provenance the loader had
/// established before failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// What went wrong.
    pub error: LoadError,
    /// Source being read when the failure happened, if known.
    pub source: String,
    /// Path being read when the failure happened, if known.
    pub path: String,
}

impl LoadFailure {
    /// Attach provenance to a failure.
    #[must_use]
    pub fn at(mut self, source: impl Into<String>, path: impl Into<String>) -> Self {
        self.source = source.into();
        self.path = path.into();
        self
    }
}

impl From<LoadError> for LoadFailure {
    fn from(error: LoadError) -> Self {
        Self {
            error,
            source: String::new(),
            path: String::new(),
        }
    }
}

impl From<ContextError> for LoadFailure {
    fn from(error: ContextError) -> Self {
        LoadError::from(error).into()
    }
}

/// Errors raised while decoding or validating a policy document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not valid YAML for the policy schema.
    #[error("YAML decode failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document decoded but breaks a policy rule.
    #[error("Invalid policy: {0}")]
    Invalid(String),
}
