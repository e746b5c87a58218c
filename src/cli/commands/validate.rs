//! Implementation of the `policy-fetcher validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, PolicySummary};
use crate::domain::models::PolicyConfig;

/// Arguments for `policy-fetcher validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Policy file to check
    pub path: PathBuf,
}

/// Result of `policy-fetcher validate`.
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    /// File that was checked.
    pub path: PathBuf,
    /// Whether the file decoded and validated cleanly.
    pub valid: bool,
    /// Decode or validation error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Summary of the policy when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PolicySummary>,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        match (&self.summary, &self.error) {
            (Some(summary), _) => {
                let mut lines = vec![format!("{} is a valid policy", self.path.display())];
                lines.extend(summary.human_lines());
                lines.join("\n")
            }
            (None, Some(error)) => format!("{} is invalid: {error}", self.path.display()),
            (None, None) => format!("{} is invalid", self.path.display()),
        }
    }
}

/// Check a policy file. Returns whether it decoded cleanly.
pub async fn execute(args: ValidateArgs, json_mode: bool) -> Result<bool> {
    let result = validate_file(&args.path).await?;
    let valid = result.valid;
    output(&result, json_mode);
    Ok(valid)
}

/// Strictly decode the policy file at `path`.
pub async fn validate_file(path: &std::path::Path) -> Result<ValidateOutput> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read policy file: {}", path.display()))?;

    Ok(match PolicyConfig::from_yaml_strict(&content) {
        Ok(config) => ValidateOutput {
            path: path.to_path_buf(),
            valid: true,
            error: None,
            summary: Some(PolicySummary::from_config(&config)),
        },
        Err(err) => ValidateOutput {
            path: path.to_path_buf(),
            valid: false,
            error: Some(err.to_string()),
            summary: None,
        },
    })
}
