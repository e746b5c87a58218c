//! Layered configuration loading and validation.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::AppConfig;
use crate::infrastructure::logging::logger::parse_log_level;

/// Config file read from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "policy-fetcher.yaml";

/// Prefix for environment overrides; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "POLICY_FETCHER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `github.api_url` is blank.
    #[error("GitHub API URL cannot be empty")]
    EmptyApiUrl,

    /// `github.timeout_secs` is zero.
    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    /// `retry.initial_backoff_ms` is zero.
    #[error("Invalid initial_backoff_ms: {0}. Must be at least 1")]
    InvalidBackoff(u64),

    /// `loader.paths` is empty.
    #[error("At least one policy path must be configured")]
    NoPolicyPaths,

    /// `logging.level` is not a known level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Any other invalid combination.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `path`, or `policy-fetcher.yaml` in the working directory (optional)
    /// 3. Environment variables (`POLICY_FETCHER_*`, highest priority)
    ///
    /// `GITHUB_TOKEN` supplies `github.token` when nothing else does.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config: AppConfig = Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        if config.github.token.as_deref().is_none_or(str::is_empty) {
            config.github.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// The provider stack behind [`load`](Self::load).
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if config.github.api_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }

        if config.github.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.github.timeout_secs));
        }

        if config.retry.initial_backoff_ms == 0 {
            return Err(ConfigError::InvalidBackoff(config.retry.initial_backoff_ms));
        }

        if config.loader.paths.is_empty() {
            return Err(ConfigError::NoPolicyPaths);
        }

        if config.loader.paths.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "policy paths cannot be empty strings".to_string(),
            ));
        }

        if config.loader.default_repository.is_some() && config.loader.default_paths.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "default_repository requires at least one default path".to_string(),
            ));
        }

        if parse_log_level(&config.logging.level).is_err() {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}
