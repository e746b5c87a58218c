//! Domain layer for the policy fetcher
//!
//! Policy document types, fetch results, error taxonomy, the execution
//! context, and the port the fetcher uses to reach a remote loader.

pub mod context;
pub mod errors;
pub mod models;
pub mod ports;

pub use context::FetchContext;
pub use errors::{ApiError, ContextError, LoadError, LoadFailure, ParseError};
