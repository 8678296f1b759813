use super::NoteIndex;
use crate::error::NotesError;
use crate::note_graph::alias::AliasTable;
use crate::note_graph::excerpt::render_excerpt;
use crate::note_graph::graph::fold_link_facts;
use crate::note_graph::loader::load_notes;
use crate::note_graph::markup::{LinkFacts, render_markdown};
use crate::note_graph::models::{AliasMapMode, Diagnostics, ManifestEntry, Note};
use crate::note_graph::report::{enforce_failure_mode, log_diagnostics, write_diagnostics_report};
use crate::note_graph::runtime_config::NotesRuntimeConfig;
use crate::note_graph::slug::{assign_slugs, base_candidate};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Knobs of the CPU-bound build phase.
#[derive(Debug, Clone, Copy)]
struct ExtractOptions {
    excerpt_paragraphs: usize,
    alias_map_mode: AliasMapMode,
}

impl NoteIndex {
    /// Load and index every note below `root`.
    ///
    /// File reads overlap on the async runtime; extraction runs on rayon
    /// inside a blocking task. Diagnostics are logged, the report is written
    /// when configured, and strict failure mode is enforced last.
    ///
    /// # Errors
    ///
    /// Returns [`NotesError::InvalidRoot`] for a bad corpus root,
    /// [`NotesError::Join`] when the extraction task dies, and
    /// [`NotesError::StrictDiagnostics`] in strict mode with diagnostics.
    pub async fn build(root: &Path, config: &NotesRuntimeConfig) -> Result<Self, NotesError> {
        let started = Instant::now();
        let notes = load_notes(root, &config.excluded_dirs, config.read_concurrency).await?;
        debug!(
            "loaded {} notes in {:.2}ms",
            notes.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );

        let options = ExtractOptions {
            excerpt_paragraphs: config.excerpt_paragraphs,
            alias_map_mode: config.alias_map_mode,
        };
        let root_owned = root.to_path_buf();
        let index =
            tokio::task::spawn_blocking(move || Self::from_notes(root_owned, notes, options))
                .await?;

        let stats = index.stats();
        info!(
            "note index built: {} notes, {} links, {} broken, {} conflicts in {:.2}ms",
            stats.total_notes,
            stats.links_in_graph,
            stats.broken_links,
            stats.alias_conflicts,
            started.elapsed().as_secs_f64() * 1000.0
        );
        log_diagnostics(&index.diagnostics);
        if let Some(path) = &config.report_path {
            write_diagnostics_report(path, &index.diagnostics).await;
        }
        enforce_failure_mode(config.failure_mode, &index.diagnostics)?;
        Ok(index)
    }

    /// Index already-loaded notes synchronously, in the given order.
    #[must_use]
    pub fn from_loaded_notes(root: PathBuf, notes: Vec<Note>, config: &NotesRuntimeConfig) -> Self {
        Self::from_notes(
            root,
            notes,
            ExtractOptions {
                excerpt_paragraphs: config.excerpt_paragraphs,
                alias_map_mode: config.alias_map_mode,
            },
        )
    }

    fn from_notes(root: PathBuf, notes: Vec<Note>, options: ExtractOptions) -> Self {
        let bases: Vec<String> = notes.iter().map(base_candidate).collect();
        let slugs = assign_slugs(&bases);
        let manifest: Vec<ManifestEntry> = notes
            .iter()
            .zip(&slugs)
            .map(|(note, slug)| ManifestEntry {
                slug: slug.clone(),
                title: note.title.clone(),
                path: note.path.clone(),
            })
            .collect();
        let position_by_slug: HashMap<String, usize> = slugs
            .iter()
            .enumerate()
            .map(|(position, slug)| (slug.clone(), position))
            .collect();
        let aliases = AliasTable::build(&notes, &slugs);

        let extract_started = Instant::now();
        let extracted: Vec<(LinkFacts, String)> = notes
            .par_iter()
            .map(|note| {
                let mut facts = LinkFacts::default();
                let _ = render_markdown(&note.body, &aliases, &mut facts);
                let excerpt = render_excerpt(&note.body, options.excerpt_paragraphs, &aliases);
                (facts, excerpt)
            })
            .collect();
        debug!(
            "extracted links and excerpts for {} notes in {:.2}ms",
            extracted.len(),
            extract_started.elapsed().as_secs_f64() * 1000.0
        );

        let (facts, excerpt_bodies): (Vec<LinkFacts>, Vec<String>) = extracted.into_iter().unzip();
        let fold = fold_link_facts(&manifest, &facts);
        let diagnostics = Diagnostics {
            broken_links: fold.broken_links,
            alias_conflicts: aliases.conflicts(),
        };
        let excerpts = slugs.iter().cloned().zip(excerpt_bodies).collect();

        Self {
            root,
            notes,
            manifest,
            position_by_slug,
            aliases,
            alias_map_mode: options.alias_map_mode,
            graph: fold.graph,
            diagnostics,
            excerpts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note_graph::loader::parse_note;

    fn index_of(files: &[(&str, &str)]) -> Result<NoteIndex, Box<dyn std::error::Error>> {
        let notes = files
            .iter()
            .map(|(path, content)| parse_note(path, content).ok_or("note"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NoteIndex::from_loaded_notes(
            PathBuf::from("/notes"),
            notes,
            &NotesRuntimeConfig::default(),
        ))
    }

    #[test]
    fn test_duplicate_titles_get_suffixes_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let index = index_of(&[
            ("a.md", "---\ntitle: Apple\n---\nfirst"),
            ("b.md", "---\ntitle: Apple\n---\nsecond"),
        ])?;
        let slugs: Vec<&str> = index.manifest().iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["apple", "apple-2"]);
        assert_eq!(index.resolve("b"), Some("apple-2"));
        assert_eq!(index.diagnostics().alias_conflicts.len(), 1);
        Ok(())
    }

    #[test]
    fn test_self_loop_is_kept() -> Result<(), Box<dyn std::error::Error>> {
        let index = index_of(&[("loop.md", "see [[loop]] and [[loop|again]]")])?;
        assert_eq!(index.graph().outgoing["loop"], vec!["loop"]);
        assert_eq!(index.graph().incoming["loop"], vec!["loop"]);
        assert_eq!(index.stats().orphans, 0);
        assert_eq!(index.stats().links_in_graph, 1);
        Ok(())
    }

    #[test]
    fn test_note_doc_and_excerpt_lookup() -> Result<(), Box<dyn std::error::Error>> {
        let index = index_of(&[("dir/x.md", "---\ntitle: X Note\n---\nBody [[Nowhere]]")])?;
        let doc = index.note("x-note").ok_or("doc")?;
        assert_eq!(doc.path, "dir/x.md");
        assert_eq!(doc.content, "Body [[Nowhere]]");
        assert!(index.excerpt("x-note").is_some_and(|html| html.contains("is-missing")));
        assert!(index.note("missing").is_none());
        assert_eq!(index.stats().broken_links, 1);
        Ok(())
    }
}
