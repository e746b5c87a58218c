//! Implementation of the `policy-fetcher fetch` command.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::adapters::github::{GitHubClient, GitHubConfigLoader};
use crate::cli::output::{output, CommandOutput, PolicySummary};
use crate::domain::context::FetchContext;
use crate::domain::models::{AppConfig, FetchOutcome, FetchedConfig};
use crate::services::{ConfigFetcher, RetryPolicy};

/// Arguments for `policy-fetcher fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Repository as owner/name
    pub repository: RepoSlug,

    /// Branch whose policy to load
    #[arg(short, long, default_value = "main")]
    pub branch: String,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// An `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl FromStr for RepoSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(format!("expected owner/repo, got '{s}'")),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// How a fetch ended, as reported to the user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// No policy file is defined.
    Absent,
    /// A valid policy was loaded.
    Loaded,
    /// Retrieval failed.
    LoadError,
    /// The policy file failed strict decoding.
    ParseError,
}

/// Result of `policy-fetcher fetch`.
#[derive(Debug, Serialize)]
pub struct FetchOutput {
    /// Repository as `owner/repo`.
    pub repository: String,
    /// Branch that was requested.
    pub branch: String,
    /// How the fetch ended.
    pub status: FetchStatus,
    /// Where the policy was found, e.g. `acme/widgets@main`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Path of the policy file within `source`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Load or parse error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Summary of the loaded policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicySummary>,
}

impl FetchOutput {
    /// Build the command output from a fetch result.
    pub fn from_result(repository: &RepoSlug, branch: &str, fetched: &FetchedConfig) -> Self {
        let (status, error, policy) = match fetched.outcome() {
            FetchOutcome::Absent => (FetchStatus::Absent, None, None),
            FetchOutcome::Config(config) => (
                FetchStatus::Loaded,
                None,
                Some(PolicySummary::from_config(config)),
            ),
            FetchOutcome::LoadError(err) => (FetchStatus::LoadError, Some(err.to_string()), None),
            FetchOutcome::ParseError(err) => (FetchStatus::ParseError, Some(err.to_string()), None),
        };

        Self {
            repository: repository.to_string(),
            branch: branch.to_string(),
            status,
            source: fetched.source().to_string(),
            path: fetched.path().to_string(),
            error,
            policy,
        }
    }

    /// True when the fetch ended in a load or parse error.
    pub const fn is_error(&self) -> bool {
        matches!(self.status, FetchStatus::LoadError | FetchStatus::ParseError)
    }

    fn location(&self) -> String {
        match (self.source.is_empty(), self.path.is_empty()) {
            (false, false) => format!("{}:{}", self.source, self.path),
            (false, true) => self.source.clone(),
            (true, false) => self.path.clone(),
            (true, true) => format!("{}@{}", self.repository, self.branch),
        }
    }
}

impl CommandOutput for FetchOutput {
    fn to_human(&self) -> String {
        match self.status {
            FetchStatus::Absent => {
                format!("No policy defined for {}@{}", self.repository, self.branch)
            }
            FetchStatus::Loaded => {
                let mut lines = vec![format!("Loaded policy from {}", self.location())];
                if let Some(policy) = &self.policy {
                    lines.extend(policy.human_lines());
                }
                lines.join("\n")
            }
            FetchStatus::LoadError => format!(
                "Failed to load policy from {}: {}",
                self.location(),
                self.error.as_deref().unwrap_or("unknown error")
            ),
            FetchStatus::ParseError => format!(
                "Invalid policy at {}: {}",
                self.location(),
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Fetch a repository's policy. Returns false when the fetch ended in an error.
pub async fn execute(args: FetchArgs, config: &AppConfig, json_mode: bool) -> Result<bool> {
    let client = GitHubClient::from_config(&config.github)?;
    let fetcher = ConfigFetcher::new(GitHubConfigLoader::new(config.loader.clone()))
        .with_retry_policy(RetryPolicy::from(&config.retry));

    let ctx = match args.timeout_secs {
        Some(secs) => FetchContext::with_timeout(Duration::from_secs(secs)),
        None => FetchContext::new(),
    };

    let signal_ctx = ctx.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, canceling fetch");
            signal_ctx.cancel();
        }
    });

    let fetched = fetcher
        .config_for_repository_branch(
            &ctx,
            &client,
            &args.repository.owner,
            &args.repository.repo,
            &args.branch,
        )
        .await;
    signal_task.abort();

    let result = FetchOutput::from_result(&args.repository, &args.branch, &fetched);
    output(&result, json_mode);
    Ok(!result.is_error())
}
