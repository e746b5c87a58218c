//! The remote configuration loader port.

use async_trait::async_trait;

use crate::domain::context::FetchContext;
use crate::domain::errors::LoadFailure;
use crate::domain::models::RemoteDocument;

/// Locates and retrieves a policy file for a repository branch.
///
/// Implementations decide where to look (candidate paths, remote
/// references, fallback repositories). They report a missing file as
/// [`RemoteDocument::undefined`] rather than as an error, and should end
/// promptly with a [`LoadError::Context`](crate::domain::errors::LoadError::Context)
/// failure when `ctx` ends.
#[async_trait]
pub trait RemoteConfigLoader: Send + Sync {
    /// API client the loader talks through.
    type Client: Send + Sync;

    /// Load the policy file for `owner/repo` at `branch`.
    async fn load_config(
        &self,
        ctx: &FetchContext,
        client: &Self::Client,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<RemoteDocument, LoadFailure>;
}
