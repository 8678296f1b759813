//! Markdown notes link graph: slugs, aliases, wikilinks, diagnostics, excerpts.

mod alias;
mod context;
mod excerpt;
mod graph;
mod index;
mod loader;
pub mod markup;
mod models;
mod patterns;
mod report;
mod runtime_config;
mod slug;

pub use alias::{AliasTable, NameResolver, ResolvedTarget};
pub use context::BuildContext;
pub use excerpt::{DEFAULT_EXCERPT_PARAGRAPHS, render_excerpt};
pub use graph::{GraphFold, fold_link_facts};
pub use index::NoteIndex;
pub use loader::{
    DEFAULT_READ_CONCURRENCY, enumerate_notes, is_supported_note, load_notes, parse_note,
    resolve_notes_root,
};
pub use models::{
    AliasConflict, AliasData, AliasMapMode, BrokenLink, Diagnostics, GraphPayload, ManifestEntry,
    Note, NoteDoc, NoteFrontmatter, NoteGraphStats, NoteIndexPayload,
};
pub use report::{enforce_failure_mode, log_diagnostics, write_diagnostics_report};
pub use runtime_config::{
    DEFAULT_NOTES_DIR, DEFAULT_SETTINGS_FILE, FailureMode, NotesRuntimeConfig,
    failure_mode_from_env, resolve_notes_runtime, set_notes_config_override,
};
pub use slug::{FALLBACK_SLUG_BASE, SLUG_SEPARATOR, assign_slugs, base_candidate, to_slug};
