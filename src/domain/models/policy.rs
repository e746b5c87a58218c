//! Policy document schema and strict decoder.
//!
//! Every struct rejects unknown keys so that a typo in a policy file surfaces
//! as a parse error instead of silently weakening the policy.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ParseError;

/// Top-level policy configuration decoded from a repository's policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// How approval rules combine into the overall decision.
    pub policy: Policy,
    /// Named approval rules referenced from `policy.approval`.
    pub approval_rules: Vec<ApprovalRule>,
}

/// The `policy` section: how rules combine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Items that must all be satisfied for approval.
    pub approval: Vec<ApprovalItem>,
    /// Optional disapproval settings.
    pub disapproval: Option<Disapproval>,
}

/// An entry in an approval list: a rule name or a nested boolean clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApprovalItem {
    /// A rule referenced by name.
    Rule(String),
    /// All nested items must be satisfied.
    And(AndClause),
    /// Any nested item must be satisfied.
    Or(OrClause),
}

/// An `and:` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AndClause {
    /// Items that must all be satisfied.
    pub and: Vec<ApprovalItem>,
}

/// An `or:` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrClause {
    /// Items of which at least one must be satisfied.
    pub or: Vec<ApprovalItem>,
}

/// Who may block a pull request, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Disapproval {
    /// Conditions under which disapproval applies.
    #[serde(rename = "if")]
    pub predicates: Option<Predicates>,
    /// Who may disapprove.
    pub requires: Actors,
}

/// A single named approval rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalRule {
    /// Unique rule name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Conditions under which the rule applies at all.
    #[serde(default, rename = "if")]
    pub predicates: Option<Predicates>,
    /// Behavior switches for the rule.
    #[serde(default)]
    pub options: RuleOptions,
    /// Approvals the rule needs.
    #[serde(default)]
    pub requires: Requirements,
}

/// Conditions that decide whether a rule applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Predicates {
    /// Files the pull request touches.
    pub changed_files: Option<ChangedFiles>,
    /// Authors the rule applies to.
    pub has_author_in: Option<Actors>,
    /// Target branch pattern.
    pub targets_branch: Option<BranchPattern>,
    /// Source branch pattern.
    pub from_branch: Option<BranchPattern>,
    /// Labels that must all be present.
    pub has_labels: Option<Vec<String>>,
    /// Bounds on added or deleted lines.
    pub modified_lines: Option<ModifiedLines>,
    /// Title patterns.
    pub title: Option<TitlePatterns>,
}

/// Path patterns for changed files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangedFiles {
    /// Patterns a changed file must match.
    pub paths: Vec<String>,
    /// Patterns excluded from `paths`.
    pub ignore: Vec<String>,
}

/// A branch name pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchPattern {
    /// Regular expression matched against the branch name.
    pub pattern: String,
}

/// Line-count thresholds, e.g. `"> 100"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModifiedLines {
    /// Bound on added lines, e.g. `< 100`.
    pub additions: Option<String>,
    /// Bound on deleted lines.
    pub deletions: Option<String>,
    /// Bound on added plus deleted lines.
    pub total: Option<String>,
}

/// Title patterns a pull request must meet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TitlePatterns {
    /// Patterns the title must match.
    pub matches: Vec<String>,
    /// Patterns the title must not match.
    pub not_matches: Vec<String>,
}

/// Rule options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleOptions {
    /// Count the author's own approval.
    pub allow_author: bool,
    /// Count approvals from commit contributors.
    pub allow_contributor: bool,
    /// Discard approvals when new commits are pushed.
    pub invalidate_on_push: bool,
    /// Keep approvals across update merges.
    pub ignore_update_merges: bool,
    /// Automatic review request settings.
    pub request_review: Option<RequestReview>,
    /// What counts as an approval.
    pub methods: Option<ApprovalMethods>,
}

/// Automatic review requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestReview {
    /// Whether reviewers are requested automatically.
    pub enabled: bool,
    /// Which eligible reviewers to request.
    pub mode: Option<ReviewMode>,
}

/// Reviewer selection for automatic requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewMode {
    /// Request every eligible reviewer.
    AllUsers,
    /// Request a random subset.
    RandomUsers,
}

/// Ways a reviewer can approve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApprovalMethods {
    /// Exact comments that count as approval.
    pub comments: Vec<String>,
    /// Comment patterns that count as approval.
    pub comment_patterns: Vec<String>,
    /// Whether GitHub review approvals count.
    pub github_review: Option<bool>,
}

/// How many approvals a rule needs and from whom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Requirements {
    /// Number of approvals needed.
    pub count: u32,
    /// Users whose approval counts.
    pub users: Vec<String>,
    /// Teams, as `org/team`, whose members' approval counts.
    pub teams: Vec<String>,
    /// Organizations whose members' approval counts.
    pub organizations: Vec<String>,
    /// Repository permissions that qualify an approver.
    pub permissions: Vec<Permission>,
}

/// A set of users, teams, organizations or permission levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Actors {
    /// Individual users.
    pub users: Vec<String>,
    /// Teams, as `org/team`.
    pub teams: Vec<String>,
    /// Organizations.
    pub organizations: Vec<String>,
    /// Repository permission levels.
    pub permissions: Vec<Permission>,
}

/// Repository permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Full administrative access.
    Admin,
    /// Maintain access.
    Maintain,
    /// Write access.
    Write,
    /// Triage access.
    Triage,
    /// Read access.
    Read,
}

impl PolicyConfig {
    /// Strictly decode and validate a policy document.
    ///
    /// Empty or `null` documents decode to the empty policy.
    pub fn from_yaml_strict(content: &[u8]) -> Result<Self, ParseError> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let config: Option<Self> = serde_yaml::from_slice(content)?;
        let config = config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Look up an approval rule by name.
    pub fn rule(&self, name: &str) -> Option<&ApprovalRule> {
        self.approval_rules.iter().find(|rule| rule.name == name)
    }

    /// Rule names referenced from the approval policy, in document order.
    pub fn referenced_rules(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_rule_names(&self.policy.approval, &mut names);
        names
    }

    fn validate(&self) -> Result<(), ParseError> {
        let mut seen = HashSet::new();
        for rule in &self.approval_rules {
            if rule.name.trim().is_empty() {
                return Err(ParseError::Invalid(
                    "approval rule name must not be empty".to_string(),
                ));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ParseError::Invalid(format!(
                    "duplicate approval rule name: '{}'",
                    rule.name
                )));
            }
        }

        validate_items(&self.policy.approval)?;

        for name in self.referenced_rules() {
            if !seen.contains(name) {
                return Err(ParseError::Invalid(format!(
                    "policy references undefined approval rule '{name}'"
                )));
            }
        }

        Ok(())
    }
}

fn validate_items(items: &[ApprovalItem]) -> Result<(), ParseError> {
    for item in items {
        match item {
            ApprovalItem::Rule(_) => {}
            ApprovalItem::And(AndClause { and: nested }) => {
                if nested.is_empty() {
                    return Err(ParseError::Invalid("'and' clause must not be empty".to_string()));
                }
                validate_items(nested)?;
            }
            ApprovalItem::Or(OrClause { or: nested }) => {
                if nested.is_empty() {
                    return Err(ParseError::Invalid("'or' clause must not be empty".to_string()));
                }
                validate_items(nested)?;
            }
        }
    }
    Ok(())
}

fn collect_rule_names<'a>(items: &'a [ApprovalItem], out: &mut Vec<&'a str>) {
    for item in items {
        match item {
            ApprovalItem::Rule(name) => out.push(name),
            ApprovalItem::And(AndClause { and: nested })
            | ApprovalItem::Or(OrClause { or: nested }) => collect_rule_names(nested, out),
        }
    }
}
