//! Result of fetching a repository's policy configuration.

use crate::domain::errors::{LoadError, ParseError};
use crate::domain::models::policy::PolicyConfig;

/// What a fetch produced. Exactly one variant applies, so a result can never
/// carry both a config and an error.
#[derive(Debug)]
pub enum FetchOutcome {
    /// No policy file exists. This is a valid outcome, not an error.
    Absent,
    /// The document was retrieved and decoded.
    Config(PolicyConfig),
    /// Retrieval failed permanently, or the caller's context ended.
    LoadError(LoadError),
    /// The document was retrieved but failed strict decoding.
    ParseError(ParseError),
}

/// The policy configuration for one repository branch, with provenance.
#[derive(Debug)]
pub struct FetchedConfig {
    source: String,
    path: String,
    outcome: FetchOutcome,
}

impl FetchedConfig {
    /// Build a result from its parts.
    pub fn new(source: impl Into<String>, path: impl Into<String>, outcome: FetchOutcome) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            outcome,
        }
    }

    /// A result for a repository with no policy file.
    pub fn absent(source: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(source, path, FetchOutcome::Absent)
    }

    /// Where the document was found, e.g. `acme/widgets@main`.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Path of the file consulted within [`source`](Self::source).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// What the fetch produced.
    pub fn outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    /// The decoded policy, if one was loaded.
    pub fn config(&self) -> Option<&PolicyConfig> {
        match &self.outcome {
            FetchOutcome::Config(config) => Some(config),
            _ => None,
        }
    }

    /// The retrieval error, if retrieval failed.
    pub fn load_error(&self) -> Option<&LoadError> {
        match &self.outcome {
            FetchOutcome::LoadError(err) => Some(err),
            _ => None,
        }
    }

    /// The decode error, if the document was invalid.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match &self.outcome {
            FetchOutcome::ParseError(err) => Some(err),
            _ => None,
        }
    }

    /// True when no policy file was defined for the repository.
    pub fn is_absent(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Absent)
    }

    /// True when either a load or a parse error was recorded.
    pub fn is_error(&self) -> bool {
        matches!(
            self.outcome,
            FetchOutcome::LoadError(_) | FetchOutcome::ParseError(_)
        )
    }
}
