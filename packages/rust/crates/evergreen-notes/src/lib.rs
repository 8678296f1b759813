//! evergreen-notes - Link graph indexer for markdown note corpora.
//!
//! Module layout:
//! - `note_graph`: loader, slug assignment, alias resolution, wikilink
//!   rendering, graph/diagnostics fold, excerpts, build context
//! - `error`: library error enum
//!
//! # Examples
//!
//! ```rust
//! use evergreen_notes::{NoteIndex, NotesRuntimeConfig, parse_note};
//! use std::path::PathBuf;
//!
//! let notes = vec![
//!     parse_note("apple.md", "An [[Pear|pear]] a day.").unwrap(),
//!     parse_note("pear.md", "---\ntitle: Pear\n---\nBack to [[apple]].").unwrap(),
//! ];
//! let index = NoteIndex::from_loaded_notes(
//!     PathBuf::from("notes"),
//!     notes,
//!     &NotesRuntimeConfig::default(),
//! );
//! assert_eq!(index.graph().outgoing["apple"], vec!["pear".to_string()]);
//! assert_eq!(index.resolve("Pear"), Some("pear"));
//! ```

pub mod error;
pub mod note_graph;

pub use error::NotesError;
pub use note_graph::{
    AliasConflict, AliasData, AliasMapMode, BrokenLink, BuildContext, Diagnostics, FailureMode,
    GraphPayload, ManifestEntry, NameResolver, Note, NoteDoc, NoteGraphStats, NoteIndex,
    NoteIndexPayload, NotesRuntimeConfig, ResolvedTarget, load_notes, parse_note,
    render_excerpt, resolve_notes_runtime, set_notes_config_override, to_slug,
};
