//! Name-form → canonical slug table with conflict tracking.

use super::models::{AliasConflict, AliasData, AliasMapMode, Note};
use super::slug::to_slug;
use std::collections::{BTreeMap, HashMap};

/// Outcome of resolving one wikilink target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Target in slug form.
    pub normalized: String,
    /// Canonical slug, when the target names a known note.
    pub slug: Option<String>,
    /// Titles of every note competing for an ambiguous name-form.
    pub ambiguous_titles: Vec<String>,
}

/// Resolves wikilink targets to canonical slugs.
pub trait NameResolver {
    /// Resolve a target as written inside `[[...]]`.
    fn resolve_target(&self, raw_target: &str) -> ResolvedTarget;
}

/// Alias table for one build.
///
/// Built once every slug is final; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    alias_map: HashMap<String, String>,
    claims: BTreeMap<String, Vec<String>>,
    aliases_by_slug: BTreeMap<String, Vec<String>>,
    title_by_slug: HashMap<String, String>,
}

impl AliasTable {
    /// Register every name-form of every note, in enumeration order.
    ///
    /// `slugs[i]` is the canonical slug of `notes[i]`.
    #[must_use]
    pub fn build(notes: &[Note], slugs: &[String]) -> Self {
        let mut table = Self::default();
        for (note, slug) in notes.iter().zip(slugs) {
            table.title_by_slug.insert(slug.clone(), note.title.clone());
            table.aliases_by_slug.entry(slug.clone()).or_default();
            let forms = [note.title.as_str(), note.stem.as_str()]
                .into_iter()
                .chain(note.raw_aliases.iter().map(String::as_str))
                .chain(note.override_slug.as_deref());
            for form in forms {
                table.register(form, slug);
            }
        }
        table
    }

    /// Register one name-form for `slug`. First registrant keeps the form.
    pub fn register(&mut self, name_form: &str, slug: &str) {
        let key = to_slug(name_form);
        if key.is_empty() {
            return;
        }

        let declared = self.aliases_by_slug.entry(slug.to_string()).or_default();
        if !declared.contains(&key) {
            declared.push(key.clone());
        }

        let claimants = self.claims.entry(key.clone()).or_default();
        if !claimants.iter().any(|existing| existing == slug) {
            claimants.push(slug.to_string());
        }
        self.alias_map.entry(key).or_insert_with(|| slug.to_string());
    }

    /// Whether `slug` belongs to a note of this build.
    #[must_use]
    pub fn contains_slug(&self, slug: &str) -> bool {
        self.title_by_slug.contains_key(slug)
    }

    /// Title of the note owning `slug`.
    #[must_use]
    pub fn title_of(&self, slug: &str) -> Option<&str> {
        self.title_by_slug.get(slug).map(String::as_str)
    }

    /// Committed slug for an already-normalized name-form.
    #[must_use]
    pub fn lookup(&self, name_form: &str) -> Option<&str> {
        self.alias_map.get(name_form).map(String::as_str)
    }

    /// Competing slugs for a conflicted, already-normalized name-form.
    #[must_use]
    pub fn competing_slugs(&self, name_form: &str) -> Option<&[String]> {
        self.claims
            .get(name_form)
            .filter(|slugs| slugs.len() > 1)
            .map(Vec::as_slice)
    }

    /// Resolve any name to a canonical slug.
    ///
    /// Alias table first, then the normalized form as a literal slug.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let key = to_slug(name);
        if let Some(slug) = self.lookup(&key) {
            return Some(slug);
        }
        self.title_by_slug
            .get_key_value(key.as_str())
            .map(|(slug, _)| slug.as_str())
    }

    /// Name-forms claimed by two or more notes, sorted by name-form.
    #[must_use]
    pub fn conflicts(&self) -> Vec<AliasConflict> {
        self.claims
            .iter()
            .filter(|(_, slugs)| slugs.len() > 1)
            .map(|(alias, slugs)| AliasConflict {
                alias: alias.clone(),
                slugs: slugs.clone(),
            })
            .collect()
    }

    /// Published alias tables.
    #[must_use]
    pub fn alias_data(&self, mode: AliasMapMode) -> AliasData {
        let alias_to_slugs = self
            .claims
            .iter()
            .filter(|(_, slugs)| mode == AliasMapMode::All || slugs.len() > 1)
            .map(|(alias, slugs)| (alias.clone(), slugs.clone()))
            .collect();
        AliasData {
            alias_map: self
                .alias_map
                .iter()
                .map(|(alias, slug)| (alias.clone(), slug.clone()))
                .collect(),
            aliases_by_slug: self.aliases_by_slug.clone(),
            alias_to_slugs,
        }
    }
}

impl NameResolver for AliasTable {
    fn resolve_target(&self, raw_target: &str) -> ResolvedTarget {
        let normalized = to_slug(raw_target);
        let slug = self.resolve(&normalized).map(str::to_string);
        let ambiguous_titles = match (&slug, self.competing_slugs(&normalized)) {
            (Some(_), Some(competing)) => competing
                .iter()
                .filter_map(|slug| self.title_of(slug))
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        ResolvedTarget {
            normalized,
            slug,
            ambiguous_titles,
        }
    }
}
