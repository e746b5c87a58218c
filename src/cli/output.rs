//! Output formatting utilities for the CLI.

use serde::Serialize;

/// Result of a command that can be rendered for people or as JSON.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Print `result` to stdout in the selected format.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Report a command failure on stderr.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
}

/// Condensed view of a decoded policy for display.
#[derive(Debug, Clone, Serialize)]
pub struct PolicySummary {
    /// Rule names referenced from the approval policy.
    pub approval: Vec<String>,
    /// Approval rules defined in the document.
    pub rules: Vec<RuleSummary>,
}

/// One approval rule, condensed.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSummary {
    /// Rule name.
    pub name: String,
    /// Approvals the rule requires.
    pub required_approvals: u32,
}

impl PolicySummary {
    /// Summarize a decoded policy.
    pub fn from_config(config: &crate::domain::models::PolicyConfig) -> Self {
        Self {
            approval: config
                .referenced_rules()
                .into_iter()
                .map(str::to_string)
                .collect(),
            rules: config
                .approval_rules
                .iter()
                .map(|rule| RuleSummary {
                    name: rule.name.clone(),
                    required_approvals: rule.requires.count,
                })
                .collect(),
        }
    }

    /// Human-readable lines, indented for nesting under a heading.
    pub fn human_lines(&self) -> Vec<String> {
        if self.rules.is_empty() {
            return vec!["  (no approval rules)".to_string()];
        }
        self.rules
            .iter()
            .map(|rule| {
                let marker = if self.approval.contains(&rule.name) { "*" } else { " " };
                format!(
                    "  {marker} {} (requires {} approval{})",
                    rule.name,
                    rule.required_approvals,
                    if rule.required_approvals == 1 { "" } else { "s" }
                )
            })
            .collect()
    }
}
