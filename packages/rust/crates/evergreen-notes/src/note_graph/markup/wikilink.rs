use super::rules::{InlineRule, InlineToken, SpanMatch};
use crate::note_graph::alias::ResolvedTarget;

/// `[[Target]]` / `[[Target|Label]]` recognizer.
///
/// Closes at the first `]]` inside the window; nested double brackets are
/// not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiLinkRule;

impl InlineRule for WikiLinkRule {
    fn name(&self) -> &'static str {
        "wikilink"
    }

    fn try_match<'a>(&self, src: &'a str, pos: usize, max: usize) -> Option<SpanMatch<'a>> {
        let bytes = src.as_bytes();
        if pos + 1 >= max || bytes[pos] != b'[' || bytes[pos + 1] != b'[' {
            return None;
        }
        let inner_start = pos + 2;
        let close = src[inner_start..max].find("]]")? + inner_start;
        let raw = src[inner_start..close].trim();
        let (target, label) = match raw.split_once('|') {
            Some((target, label)) => (target.trim(), label.trim()),
            None => (raw, raw),
        };
        Some(SpanMatch {
            tokens: vec![InlineToken::WikiLink { target, label }],
            end: close + 2,
        })
    }
}

/// Unresolved wikilink occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLink {
    /// Target as written.
    pub raw_target: String,
    /// Target in slug form.
    pub normalized: String,
}

/// Side-channel facts collected while rendering one note.
///
/// Passed by `&mut` into the render call; the caller merges it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFacts {
    /// Resolved target slug per occurrence, in document order.
    pub edges: Vec<String>,
    /// Unresolved occurrences, in document order.
    pub broken: Vec<UnresolvedLink>,
}

impl LinkFacts {
    /// Record one occurrence.
    pub fn record(&mut self, raw_target: &str, resolved: &ResolvedTarget) {
        match &resolved.slug {
            Some(slug) => self.edges.push(slug.clone()),
            None => self.broken.push(UnresolvedLink {
                raw_target: raw_target.to_string(),
                normalized: resolved.normalized.clone(),
            }),
        }
    }
}

pub(super) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Anchor markup for one wikilink occurrence.
///
/// Navigation is left to the host application (`href="#"`); the canonical
/// slug travels in `data-slug`.
#[must_use]
pub fn render_wikilink_anchor(label: &str, resolved: &ResolvedTarget) -> String {
    let mut classes = String::from("wikilink");
    let mut attrs = String::new();
    match &resolved.slug {
        Some(slug) => {
            attrs.push_str(" data-missing=\"false\"");
            attrs.push_str(&format!(" data-slug=\"{}\"", escape_html(slug)));
            if !resolved.ambiguous_titles.is_empty() {
                classes.push_str(" is-ambiguous");
                attrs.push_str(&format!(
                    " data-amb-list=\"{}\"",
                    escape_html(&resolved.ambiguous_titles.join(", "))
                ));
            }
        }
        None => {
            classes.push_str(" is-missing");
            attrs.push_str(" data-missing=\"true\"");
        }
    }
    format!(
        "<a href=\"#\" class=\"{classes}\"{attrs}>{}</a>",
        escape_html(label)
    )
}
