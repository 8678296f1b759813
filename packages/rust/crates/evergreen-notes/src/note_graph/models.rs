//! Shared models for note indexing and the published snapshot payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Front-matter narrowed at the loader boundary.
///
/// Recognized keys get named fields; everything else stays in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFrontmatter {
    /// `title`, trimmed and non-empty.
    pub title: Option<String>,
    /// `aliases` (string or list of strings), blanks dropped.
    pub aliases: Vec<String>,
    /// First non-empty of `slug`, `url`, `permalink`.
    pub slug_override: Option<String>,
    /// Unrecognized keys.
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// One loaded source note. Immutable for the lifetime of a build.
#[derive(Debug, Clone)]
pub struct Note {
    /// Forward-slash path relative to the corpus root (`folder/note.md`).
    pub path: String,
    /// File name without the `.md` extension.
    pub stem: String,
    /// Front-matter title, else the file stem.
    pub title: String,
    /// Declared aliases as written.
    pub raw_aliases: Vec<String>,
    /// Explicit identifier override as written.
    pub override_slug: Option<String>,
    /// Unrecognized front-matter keys.
    pub extra: BTreeMap<String, serde_yaml::Value>,
    /// Content after the front-matter block.
    pub body: String,
}

/// Externally published identity record for a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Canonical slug.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Relative source path.
    pub path: String,
}

/// Note identity plus body content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDoc {
    /// Canonical slug.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Relative source path.
    pub path: String,
    /// Body without front-matter.
    pub content: String,
}

/// Bidirectional one-hop adjacency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPayload {
    /// Every slug mapped to the sorted slugs it links to.
    pub outgoing: BTreeMap<String, Vec<String>>,
    /// Linked slugs mapped to the sorted slugs linking to them.
    pub incoming: BTreeMap<String, Vec<String>>,
}

/// Which name-forms appear in [`AliasData::alias_to_slugs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasMapMode {
    /// Only name-forms claimed by two or more notes.
    #[default]
    Conflicts,
    /// Every registered name-form.
    All,
}

impl AliasMapMode {
    /// Parse mode aliases from user/runtime input.
    #[must_use]
    pub fn from_alias(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "all" | "full" => Self::All,
            _ => Self::Conflicts,
        }
    }
}

/// Published alias tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasData {
    /// Committed resolution per name-form.
    pub alias_map: BTreeMap<String, String>,
    /// Name-forms each note declared.
    pub aliases_by_slug: BTreeMap<String, Vec<String>>,
    /// Competing slugs per name-form (see [`AliasMapMode`]).
    pub alias_to_slugs: BTreeMap<String, Vec<String>>,
}

/// Wikilink whose target resolves to no known note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLink {
    /// Slug of the note containing the link.
    pub from_slug: String,
    /// Title of the note containing the link.
    pub from_title: String,
    /// Target as written inside the brackets.
    pub target: String,
    /// Normalized target.
    pub target_slug: String,
}

/// Name-form claimed by more than one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConflict {
    /// Normalized name-form.
    pub alias: String,
    /// Competing slugs in registration order; the first one wins.
    pub slugs: Vec<String>,
}

/// Build diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Unresolved wikilink occurrences.
    pub broken_links: Vec<BrokenLink>,
    /// Ambiguous name-forms.
    pub alias_conflicts: Vec<AliasConflict>,
}

impl Diagnostics {
    /// Whether the build produced no diagnostics at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.broken_links.is_empty() && self.alias_conflicts.is_empty()
    }
}

/// Summary stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteGraphStats {
    /// Total indexed notes.
    pub total_notes: usize,
    /// Notes with no incoming/outgoing links.
    pub orphans: usize,
    /// Total directed links.
    pub links_in_graph: usize,
    /// Total graph nodes.
    pub nodes_in_graph: usize,
    /// Unresolved wikilink occurrences.
    pub broken_links: usize,
    /// Ambiguous name-forms.
    pub alias_conflicts: usize,
}

/// Complete build snapshot as published to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteIndexPayload {
    /// Identity records in enumeration order.
    pub manifest: Vec<ManifestEntry>,
    /// Link graph.
    pub graph: GraphPayload,
    /// Alias tables.
    pub aliases: AliasData,
    /// Broken links and alias conflicts.
    pub diagnostics: Diagnostics,
    /// Rendered excerpt per slug.
    pub excerpts: BTreeMap<String, String>,
}
