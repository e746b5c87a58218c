//! Policy file lookup against GitHub repositories.
//!
//! The loader tries each configured path in the target repository at the
//! requested branch. A file found there may be a [`RemoteReference`], in
//! which case the referenced file is loaded instead. When nothing is found
//! and an organization-level default repository is configured, that
//! repository is searched at its default branch.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::context::FetchContext;
use crate::domain::errors::{LoadError, LoadFailure};
use crate::domain::models::{format_source, LoaderConfig, RemoteDocument};
use crate::domain::ports::RemoteConfigLoader;

use super::client::GitHubClient;
use super::models::RemoteReference;

/// [`RemoteConfigLoader`] backed by the GitHub contents API.
#[derive(Debug, Clone)]
pub struct GitHubConfigLoader {
    config: LoaderConfig,
}

impl GitHubConfigLoader {
    /// Create a loader that searches the locations in `config`.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// The lookup configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load from `paths` in one repository, following a remote reference if
    /// the file found is one.
    async fn load_from_paths(
        &self,
        ctx: &FetchContext,
        client: &GitHubClient,
        owner: &str,
        repo: &str,
        git_ref: &str,
        paths: &[String],
    ) -> Result<Option<RemoteDocument>, LoadFailure> {
        for path in paths {
            let source = format_source(owner, repo, git_ref);
            let content = client
                .get_file(ctx, owner, repo, path, Some(git_ref))
                .await
                .map_err(|e| LoadFailure::from(e).at(&source, path))?;

            let Some(content) = content else {
                debug!(source = %source, path = %path, "no policy file at path");
                continue;
            };

            if let Some(reference) = RemoteReference::parse(&content) {
                return self
                    .follow_reference(ctx, client, &reference, &source, path)
                    .await
                    .map(Some);
            }

            return Ok(Some(RemoteDocument::found(source, path.as_str(), content)));
        }
        Ok(None)
    }

    async fn follow_reference(
        &self,
        ctx: &FetchContext,
        client: &GitHubClient,
        reference: &RemoteReference,
        source: &str,
        path: &str,
    ) -> Result<RemoteDocument, LoadFailure> {
        let Some((remote_owner, remote_repo)) = reference.split_remote() else {
            return Err(LoadFailure::from(LoadError::InvalidReference(format!(
                "remote '{}' must have the form owner/repo",
                reference.remote
            )))
            .at(source, path));
        };

        let remote_path = reference.path.as_deref().unwrap_or(path);
        let remote_ref = match reference.git_ref.as_deref().filter(|r| !r.is_empty()) {
            Some(git_ref) => git_ref.to_string(),
            None => client
                .default_branch(ctx, remote_owner, remote_repo)
                .await
                .map_err(|e| LoadFailure::from(e).at(source, path))?
                .ok_or_else(|| {
                    LoadFailure::from(LoadError::InvalidReference(format!(
                        "remote repository {} does not exist",
                        reference.remote
                    )))
                    .at(source, path)
                })?,
        };

        let remote_source = format_source(remote_owner, remote_repo, &remote_ref);
        debug!(
            from = %source,
            to = %remote_source,
            path = %remote_path,
            "following remote policy reference"
        );

        let content = client
            .get_file(ctx, remote_owner, remote_repo, remote_path, Some(&remote_ref))
            .await
            .map_err(|e| LoadFailure::from(e).at(&remote_source, remote_path))?;

        match content {
            Some(content) => Ok(RemoteDocument::found(remote_source, remote_path, content)),
            None => Err(LoadFailure::from(LoadError::InvalidReference(format!(
                "referenced file {remote_path} does not exist in {remote_source}"
            )))
            .at(remote_source, remote_path)),
        }
    }
}

#[async_trait]
impl RemoteConfigLoader for GitHubConfigLoader {
    type Client = GitHubClient;

    async fn load_config(
        &self,
        ctx: &FetchContext,
        client: &GitHubClient,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<RemoteDocument, LoadFailure> {
        if let Some(document) = self
            .load_from_paths(ctx, client, owner, repo, branch, &self.config.paths)
            .await?
        {
            return Ok(document);
        }

        let not_found = || {
            RemoteDocument::undefined_at(
                format_source(owner, repo, branch),
                self.config.paths.first().map_or("", String::as_str),
            )
        };

        let Some(default_repo) = self
            .config
            .default_repository
            .as_deref()
            .filter(|r| !r.is_empty() && *r != repo)
        else {
            return Ok(not_found());
        };

        let Some(default_branch) = client
            .default_branch(ctx, owner, default_repo)
            .await
            .map_err(|e| {
                LoadFailure::from(e).at(
                    format!("{owner}/{default_repo}"),
                    self.config.default_paths.first().map_or("", String::as_str),
                )
            })?
        else {
            debug!(owner = %owner, repo = %default_repo, "default repository does not exist");
            return Ok(not_found());
        };

        Ok(self
            .load_from_paths(
                ctx,
                client,
                owner,
                default_repo,
                &default_branch,
                &self.config.default_paths,
            )
            .await?
            .unwrap_or_else(not_found))
    }
}
