//! Port trait definitions (Hexagonal Architecture)
//!
//! - RemoteConfigLoader: locate and retrieve a repository's policy file
//!
//! Adapters in `crate::adapters` implement these; tests substitute fakes.

pub mod config_loader;

pub use config_loader::RemoteConfigLoader;
