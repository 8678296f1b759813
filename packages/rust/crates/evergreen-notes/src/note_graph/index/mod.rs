//! Immutable note index snapshot and its queries.

use super::alias::AliasTable;
use super::excerpt;
use super::models::{
    AliasData, AliasMapMode, Diagnostics, GraphPayload, ManifestEntry, Note, NoteDoc,
    NoteGraphStats, NoteIndexPayload,
};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

mod build;

/// One complete build over a notes corpus.
///
/// Every field is final once built; a rebuild produces a new snapshot.
#[derive(Debug, Clone)]
pub struct NoteIndex {
    root: PathBuf,
    notes: Vec<Note>,
    manifest: Vec<ManifestEntry>,
    position_by_slug: HashMap<String, usize>,
    aliases: AliasTable,
    alias_map_mode: AliasMapMode,
    graph: GraphPayload,
    diagnostics: Diagnostics,
    excerpts: BTreeMap<String, String>,
}

impl NoteIndex {
    /// Corpus root the index was built from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identity records in enumeration order.
    #[must_use]
    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    /// Manifest entry for a canonical slug.
    #[must_use]
    pub fn entry(&self, slug: &str) -> Option<&ManifestEntry> {
        self.position_by_slug
            .get(slug)
            .and_then(|position| self.manifest.get(*position))
    }

    /// Outgoing/incoming adjacency.
    #[must_use]
    pub fn graph(&self) -> &GraphPayload {
        &self.graph
    }

    /// Alias tables; `mode` selects which forms `alias_to_slugs` lists.
    #[must_use]
    pub fn alias_data(&self, mode: AliasMapMode) -> AliasData {
        self.aliases.alias_data(mode)
    }

    /// Broken links and alias conflicts.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Rendered excerpt per slug.
    #[must_use]
    pub fn excerpts(&self) -> &BTreeMap<String, String> {
        &self.excerpts
    }

    /// Rendered excerpt of one note.
    #[must_use]
    pub fn excerpt(&self, slug: &str) -> Option<&str> {
        self.excerpts.get(slug).map(String::as_str)
    }

    /// Resolve any name-form (title, file stem, alias, override or slug).
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.aliases.resolve(name)
    }

    /// Notes linking to `slug`, sorted by title (case-insensitive) then slug.
    #[must_use]
    pub fn backlinks_for(&self, slug: &str) -> Vec<&ManifestEntry> {
        let mut out: Vec<&ManifestEntry> = self
            .graph
            .incoming
            .get(slug)
            .into_iter()
            .flatten()
            .filter_map(|source| self.entry(source))
            .collect();
        out.sort_by(|left, right| {
            left.title
                .to_lowercase()
                .cmp(&right.title.to_lowercase())
                .then_with(|| left.slug.cmp(&right.slug))
        });
        out
    }

    /// Identity plus body content of one note.
    #[must_use]
    pub fn note(&self, slug: &str) -> Option<NoteDoc> {
        let position = *self.position_by_slug.get(slug)?;
        let entry = self.manifest.get(position)?;
        let note = self.notes.get(position)?;
        Some(NoteDoc {
            slug: entry.slug.clone(),
            title: entry.title.clone(),
            path: entry.path.clone(),
            content: note.body.clone(),
        })
    }

    /// Excerpt of arbitrary markdown, resolved against this index.
    #[must_use]
    pub fn render_excerpt(&self, content: &str, paragraphs: usize) -> String {
        excerpt::render_excerpt(content, paragraphs, &self.aliases)
    }

    /// Return summary stats.
    #[must_use]
    pub fn stats(&self) -> NoteGraphStats {
        let total_notes = self.manifest.len();
        let orphans = self
            .manifest
            .iter()
            .filter(|entry| {
                let out_empty = self
                    .graph
                    .outgoing
                    .get(&entry.slug)
                    .is_none_or(Vec::is_empty);
                let in_empty = self
                    .graph
                    .incoming
                    .get(&entry.slug)
                    .is_none_or(Vec::is_empty);
                out_empty && in_empty
            })
            .count();
        NoteGraphStats {
            total_notes,
            orphans,
            links_in_graph: self.graph.outgoing.values().map(Vec::len).sum(),
            nodes_in_graph: total_notes,
            broken_links: self.diagnostics.broken_links.len(),
            alias_conflicts: self.diagnostics.alias_conflicts.len(),
        }
    }

    /// Complete serializable snapshot.
    #[must_use]
    pub fn payload(&self) -> NoteIndexPayload {
        NoteIndexPayload {
            manifest: self.manifest.clone(),
            graph: self.graph.clone(),
            aliases: self.alias_data(self.alias_map_mode),
            diagnostics: self.diagnostics.clone(),
            excerpts: self.excerpts.clone(),
        }
    }
}
