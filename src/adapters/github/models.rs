//! GitHub REST API payloads and the remote reference file format.
//!
//! These structs map to the GitHub REST API v3 JSON payloads used by the
//! client. They are not part of the public domain model.

use serde::{Deserialize, Serialize};

/// Error body returned by GitHub for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubErrorBody {
    /// Human-readable error message.
    pub message: String,
    /// Link to the relevant API documentation.
    #[serde(default)]
    pub documentation_url: Option<String>,
}

/// The subset of `GET /repos/{owner}/{repo}` the loader needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepository {
    /// Full name, e.g. `acme/widgets`.
    pub full_name: String,
    /// Branch checked out by default.
    pub default_branch: String,
}

/// A policy file that points at the real policy in another repository.
///
/// ```yaml
/// remote: acme/policies
/// path: policies/widgets.yml
/// ref: main
/// ```
///
/// `path` defaults to the path of the referencing file and `ref` to the
/// remote repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteReference {
    /// Repository holding the policy, as `owner/repo`.
    pub remote: String,
    /// Path of the policy in the remote repository.
    #[serde(default)]
    pub path: Option<String>,
    /// Branch, tag or commit to read.
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
}

impl RemoteReference {
    /// Parse `content` as a remote reference.
    ///
    /// Returns `None` for anything that is not exactly a reference, so
    /// ordinary policy files pass through untouched.
    pub fn parse(content: &[u8]) -> Option<Self> {
        let reference: Self = serde_yaml::from_slice(content).ok()?;
        if reference.remote.trim().is_empty() {
            return None;
        }
        Some(reference)
    }

    /// Split `remote` into `(owner, repo)`.
    pub fn split_remote(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.remote.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner, repo))
    }
}
