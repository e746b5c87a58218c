//! GitHub policy loader adapter.
//!
//! Implements [`RemoteConfigLoader`](crate::domain::ports::RemoteConfigLoader)
//! over the GitHub REST API: raw file retrieval, remote references to
//! policies kept in another repository, and an organization-wide fallback
//! repository.

pub mod client;
pub mod loader;
pub mod models;

pub use client::GitHubClient;
pub use loader::GitHubConfigLoader;
