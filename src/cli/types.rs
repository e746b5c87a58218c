//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::fetch::FetchArgs;
use super::commands::validate::ValidateArgs;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "policy-fetcher")]
#[command(about = "Fetch and validate repository approval policies", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./policy-fetcher.yaml)
    #[arg(short, long, global = true, env = "POLICY_FETCHER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the policy for a repository branch from GitHub
    Fetch(FetchArgs),

    /// Strictly decode a local policy file
    Validate(ValidateArgs),
}
