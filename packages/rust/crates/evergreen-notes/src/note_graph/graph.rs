//! Fold of per-note link facts into the bidirectional graph.

use super::markup::LinkFacts;
use super::models::{BrokenLink, GraphPayload, ManifestEntry};
use std::collections::{BTreeMap, BTreeSet};

/// Graph plus broken links from one fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphFold {
    /// Outgoing/incoming adjacency.
    pub graph: GraphPayload,
    /// Unresolved occurrences, in enumeration then document order.
    pub broken_links: Vec<BrokenLink>,
}

/// Aggregate `facts[i]` (collected while rendering `manifest[i]`).
///
/// `outgoing` gets a key for every manifest slug; `incoming` only for slugs
/// with at least one backlink. Duplicate edges collapse, self-loops stay.
#[must_use]
pub fn fold_link_facts(manifest: &[ManifestEntry], facts: &[LinkFacts]) -> GraphFold {
    let mut outgoing: BTreeMap<String, BTreeSet<String>> = manifest
        .iter()
        .map(|entry| (entry.slug.clone(), BTreeSet::new()))
        .collect();
    let mut incoming: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut broken_links: Vec<BrokenLink> = Vec::new();

    for (entry, note_facts) in manifest.iter().zip(facts) {
        for target in &note_facts.edges {
            outgoing
                .entry(entry.slug.clone())
                .or_default()
                .insert(target.clone());
            incoming
                .entry(target.clone())
                .or_default()
                .insert(entry.slug.clone());
        }
        broken_links.extend(note_facts.broken.iter().map(|link| BrokenLink {
            from_slug: entry.slug.clone(),
            from_title: entry.title.clone(),
            target: link.raw_target.clone(),
            target_slug: link.normalized.clone(),
        }));
    }

    let into_lists = |map: BTreeMap<String, BTreeSet<String>>| -> BTreeMap<String, Vec<String>> {
        map.into_iter()
            .map(|(slug, targets)| (slug, targets.into_iter().collect()))
            .collect()
    };
    GraphFold {
        graph: GraphPayload {
            outgoing: into_lists(outgoing),
            incoming: into_lists(incoming),
        },
        broken_links,
    }
}
