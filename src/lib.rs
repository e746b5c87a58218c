//! Policy Fetcher - resilient retrieval of repository approval policies
//!
//! Fetches a repository's policy file for a given branch, strictly decodes
//! it, and reports one of four outcomes: no policy defined, a valid policy,
//! a load error, or a parse error. Transient retrieval failures are retried
//! with exponential backoff, and every wait honors caller cancellation.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): policy models, errors, execution context, ports
//! - **Service Layer** (`services`): the retrying [`ConfigFetcher`]
//! - **Adapter Layer** (`adapters`): the GitHub-backed loader
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use policy_fetcher::{ConfigFetcher, FetchContext, GitHubClient, GitHubConfigLoader};
//!
//! # async fn run(config: policy_fetcher::AppConfig) -> anyhow::Result<()> {
//! let client = GitHubClient::from_config(&config.github)?;
//! let fetcher = ConfigFetcher::new(GitHubConfigLoader::new(config.loader.clone()));
//! let fetched = fetcher
//!     .config_for_repository_branch(&FetchContext::new(), &client, "acme", "widgets", "main")
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::github::{GitHubClient, GitHubConfigLoader};
pub use domain::context::FetchContext;
pub use domain::errors::{ApiError, ContextError, LoadError, LoadFailure, ParseError};
pub use domain::models::{AppConfig, FetchOutcome, FetchedConfig, PolicyConfig, RemoteDocument};
pub use domain::ports::RemoteConfigLoader;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{is_retryable, ConfigFetcher, RetryPolicy};
