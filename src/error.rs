use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
//  Error – two-tier parse diagnostics
// ═══════════════════════════════════════════════════════════════════════════════

/// Error raised while parsing a build description.
///
/// Errors come in two tiers. A [`Warning`](ParseError::Warning) is recoverable:
/// the dispatcher logs it, drops the offending node, and keeps parsing the
/// remaining siblings. Every other variant is fatal and unwinds the parse of
/// the current document via `?`.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Recoverable problem local to a single node or attribute.
    #[error("{0}")]
    Warning(String),

    /// The document is not well-formed XML.
    #[error("{}: XML error: {source}", .path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// The document could not be read.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A solution, project, or document path did not resolve to an existing
    /// location on disk.
    #[error("could not resolve path: {0}")]
    UnresolvedPath(String),

    /// A `Match` element expanded to zero files.
    #[error("match{} returned no files: {path}/{pattern}",
        .project.as_deref().map(|p| format!(" in project {p}")).unwrap_or_default())]
    NoMatches {
        path: String,
        pattern: String,
        project: Option<String>,
    },

    /// A solution declared a second `Cleanup` block.
    #[error("solution '{0}' declares more than one Cleanup block")]
    DuplicateCleanup(String),

    /// A database reference named a provider that is not in the known table.
    #[error("unknown database provider name: {0}")]
    UnknownProvider(String),
}

impl ParseError {
    /// Build a recoverable warning from any message.
    pub fn warning(message: impl Into<String>) -> Self {
        ParseError::Warning(message.into())
    }

    /// `true` for the recoverable tier, `false` for every fatal variant.
    pub fn is_warning(&self) -> bool {
        matches!(self, ParseError::Warning(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_tier_is_recoverable() {
        assert!(ParseError::warning("oops").is_warning());
        assert!(!ParseError::UnresolvedPath("x".into()).is_warning());
    }

    #[test]
    fn no_matches_names_path_pattern_and_project() {
        let err = ParseError::NoMatches {
            path: "src".into(),
            pattern: "*.cs".into(),
            project: Some("Core".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("src"), "missing path: {msg}");
        assert!(msg.contains("*.cs"), "missing pattern: {msg}");
        assert!(msg.contains("Core"), "missing project: {msg}");
    }

    #[test]
    fn no_matches_without_project() {
        let err = ParseError::NoMatches {
            path: ".".into(),
            pattern: "*".into(),
            project: None,
        };
        assert!(!err.to_string().contains("in project"));
    }
}
