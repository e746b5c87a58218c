//! Application services.

pub mod config_fetcher;

pub use config_fetcher::{is_retryable, ConfigFetcher, RetryPolicy};
