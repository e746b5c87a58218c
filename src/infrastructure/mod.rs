//! Infrastructure layer module
//!
//! - Configuration management (figment: defaults, YAML file, environment)
//! - Logging infrastructure (tracing-subscriber with optional rotated files)

pub mod config;
pub mod logging;
