//! Domain models: policy documents, fetch results and configuration.

pub mod config;
pub mod fetched_config;
pub mod policy;
pub mod remote_document;

pub use config::{
    AppConfig, GitHubConfig, LoaderConfig, LogFormat, LoggingConfig, RetryConfig, RotationPolicy,
};
pub use fetched_config::{FetchOutcome, FetchedConfig};
pub use policy::{ApprovalItem, ApprovalRule, PolicyConfig};
pub use remote_document::{format_source, RemoteDocument};
