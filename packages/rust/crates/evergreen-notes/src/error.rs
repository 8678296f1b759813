//! Error types for note index builds.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use thiserror::Error;

/// Error types for note index builds.
///
/// Everything a single note can get wrong (front-matter, duplicate slugs,
/// broken wikilinks) is recovered locally; only corpus-level failures and
/// strict-mode violations surface here.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Corpus root does not exist or is not a directory.
    #[error("invalid notes root: {0}")]
    InvalidRoot(String),

    /// Low-level I/O error from std::io.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking build task panicked or was cancelled.
    #[error("build task failed: {0}")]
    Join(String),

    /// Strict failure mode is on and the build produced diagnostics.
    #[error(
        "strict mode: {broken_links} broken link(s), {alias_conflicts} alias conflict(s)"
    )]
    StrictDiagnostics {
        /// Number of unresolved wikilink occurrences.
        broken_links: usize,
        /// Number of conflicted name-forms.
        alias_conflicts: usize,
    },
}

impl From<tokio::task::JoinError> for NotesError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Join(value.to_string())
    }
}
