//! Application configuration sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for the policy fetcher
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    /// GitHub API client configuration
    #[serde(default)]
    pub github: GitHubConfig,

    /// Where to look for policy files
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Retry policy for transient retrieval errors
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GitHubConfig {
    /// Base URL of the REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Access token; falls back to `GITHUB_TOKEN`
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side request budget per hour
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: u32,

    /// `User-Agent` header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_requests_per_hour() -> u32 {
    5_000
}

fn default_user_agent() -> String {
    concat!("policy-fetcher/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            requests_per_hour: default_requests_per_hour(),
            user_agent: default_user_agent(),
        }
    }
}

/// Policy file lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoaderConfig {
    /// Candidate paths in the repository, tried in order
    #[serde(default = "default_paths")]
    pub paths: Vec<String>,

    /// Organization-level fallback repository (e.g. `.github`)
    #[serde(default)]
    pub default_repository: Option<String>,

    /// Candidate paths in the fallback repository
    #[serde(default = "default_fallback_paths")]
    pub default_paths: Vec<String>,
}

fn default_paths() -> Vec<String> {
    vec![".policy.yml".to_string()]
}

fn default_fallback_paths() -> Vec<String> {
    vec!["policy.yml".to_string()]
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            default_repository: None,
            default_paths: default_fallback_paths(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for stderr
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rotated log files (stderr only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable multi-line output.
    #[default]
    Pretty,
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// A new file each day.
    #[default]
    Daily,
    /// A new file each hour.
    Hourly,
    /// A single file that is never rotated.
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}
