//! Note loading: corpus enumeration, concurrent reads, front-matter split.

mod frontmatter;
mod paths;

use crate::error::NotesError;
use crate::note_graph::models::Note;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use self::frontmatter::parse_frontmatter;
use self::paths::{
    normalize_excluded_dirs, note_stem, relative_note_path, should_skip_entry,
};

pub use self::paths::is_supported_note;

/// Default number of note files read concurrently.
pub const DEFAULT_READ_CONCURRENCY: usize = 32;

/// Build a [`Note`] from its relative path and raw file content.
///
/// Returns `None` when the path has no usable file stem.
#[must_use]
pub fn parse_note(rel_path: &str, content: &str) -> Option<Note> {
    let stem = note_stem(Path::new(rel_path))?;
    let (frontmatter, body) = parse_frontmatter(content);
    let title = frontmatter.title.clone().unwrap_or_else(|| stem.clone());
    Some(Note {
        path: rel_path.to_string(),
        stem,
        title,
        raw_aliases: frontmatter.aliases,
        override_slug: frontmatter.slug_override,
        extra: frontmatter.extra,
        body: body.to_string(),
    })
}

/// Canonicalize and validate a corpus root directory.
///
/// # Errors
///
/// Returns [`NotesError::InvalidRoot`] when the path cannot be resolved or is
/// not a directory.
pub fn resolve_notes_root(root_dir: &Path) -> Result<PathBuf, NotesError> {
    let root = root_dir
        .canonicalize()
        .map_err(|e| NotesError::InvalidRoot(format!("'{}': {e}", root_dir.display())))?;
    if !root.is_dir() {
        return Err(NotesError::InvalidRoot(format!(
            "not a directory: {}",
            root.display()
        )));
    }
    Ok(root)
}

/// Enumerate markdown notes below `root` in lexicographic relative-path order.
///
/// The order is the stability contract for slug tie-breaks: two builds over
/// the same file set always see notes in the same sequence.
#[must_use]
pub fn enumerate_notes(root: &Path, excluded_dirs: &[String]) -> Vec<(String, PathBuf)> {
    let excluded = normalize_excluded_dirs(excluded_dirs);
    let mut out: Vec<(String, PathBuf)> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            !should_skip_entry(entry.path(), entry.file_type().is_dir(), root, &excluded)
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_supported_note(entry.path()))
        .filter_map(|entry| {
            let rel = relative_note_path(entry.path(), root)?;
            Some((rel, entry.path().to_path_buf()))
        })
        .collect();
    out.sort_by(|left, right| left.0.cmp(&right.0));
    out
}

/// Load every note below `root` with overlapped file reads.
///
/// Unreadable files are skipped with a warning; enumeration order is kept.
///
/// # Errors
///
/// Returns [`NotesError::InvalidRoot`] when `root` is not a directory.
pub async fn load_notes(
    root: &Path,
    excluded_dirs: &[String],
    read_concurrency: usize,
) -> Result<Vec<Note>, NotesError> {
    let root = resolve_notes_root(root)?;
    let candidates = enumerate_notes(&root, excluded_dirs);
    debug!(
        "note loader found {} candidate files under {}",
        candidates.len(),
        root.display()
    );

    let notes: Vec<Note> = stream::iter(candidates)
        .map(|(rel, abs)| async move {
            match tokio::fs::read_to_string(&abs).await {
                Ok(content) => parse_note(&rel, &content),
                Err(err) => {
                    warn!("skipping unreadable note {rel}: {err}");
                    None
                }
            }
        })
        .buffered(read_concurrency.max(1))
        .filter_map(|note| async move { note })
        .collect()
        .await;
    Ok(notes)
}
