//! Raw document returned by a remote configuration loader.

/// A configuration file as located by a loader.
///
/// `content` is `None` when no file exists at any of the locations the
/// loader consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDocument {
    /// Where the document came from, formatted `owner/repo@ref`.
    pub source: String,
    /// Path of the file within `source`.
    pub path: String,
    /// Raw file bytes.
    pub content: Option<Vec<u8>>,
}

impl RemoteDocument {
    /// A document that was found.
    pub fn found(source: impl Into<String>, path: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            content: Some(content),
        }
    }

    /// The loader's signal that no document exists.
    pub fn undefined() -> Self {
        Self::default()
    }

    /// No document exists; `source` and `path` name the primary location
    /// that was consulted.
    pub fn undefined_at(source: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            content: None,
        }
    }

    /// True when the loader found no file.
    pub fn is_undefined(&self) -> bool {
        self.content.is_none()
    }
}

/// Format a source identifier the way loaders report them.
pub fn format_source(owner: &str, repo: &str, git_ref: &str) -> String {
    format!("{owner}/{repo}@{git_ref}")
}
