use super::rules::{InlineRule, InlineToken, default_rules, tokenize_inline};
use super::wikilink::{LinkFacts, render_wikilink_anchor};
use crate::note_graph::alias::NameResolver;
use crate::note_graph::patterns::compile_regex;
use comrak::nodes::NodeValue;
use comrak::{Arena, Node, Options, format_html, parse_document};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;
use tracing::warn;

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex("\u{E000}([0-9]+)\u{E001}"));

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.autolink = true;
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.parse.smart = true;
    // Raw HTML in notes is shown as text, never passed through.
    options.render.escape = true;
    options
}

/// 1-based inclusive source line ranges of fenced and indented code blocks.
fn code_block_lines(body: &str, options: &Options<'_>) -> Vec<RangeInclusive<usize>> {
    let arena = Arena::new();
    let root = parse_document(&arena, body, options);
    root.descendants()
        .filter_map(|node| {
            let ast = node.data();
            matches!(ast.value, NodeValue::CodeBlock(_))
                .then(|| ast.sourcepos.start.line..=ast.sourcepos.end.line)
        })
        .collect()
}

/// Markdown source with every inline span rule applied.
///
/// Wikilinks become placeholders; their anchors are returned in order.
struct Prepared {
    source: String,
    anchors: Vec<String>,
}

fn flush_block(
    body: &str,
    block: &mut Option<(usize, usize)>,
    rules: &[&dyn InlineRule],
    resolver: &dyn NameResolver,
    facts: &mut LinkFacts,
    prepared: &mut Prepared,
) {
    let Some((start, end)) = block.take() else {
        return;
    };
    for token in tokenize_inline(body, start, end, rules) {
        match token {
            InlineToken::Text(text) => prepared.source.push_str(text),
            InlineToken::WikiLink { target, label } => {
                let resolved = resolver.resolve_target(target);
                facts.record(target, &resolved);
                let index = prepared.anchors.len();
                prepared
                    .anchors
                    .push(render_wikilink_anchor(label, &resolved));
                prepared
                    .source
                    .push_str(&format!("{PLACEHOLDER_OPEN}{index}{PLACEHOLDER_CLOSE}"));
            }
        }
    }
}

fn prepare(
    body: &str,
    code_lines: &[RangeInclusive<usize>],
    rules: &[&dyn InlineRule],
    resolver: &dyn NameResolver,
    facts: &mut LinkFacts,
) -> Prepared {
    let mut prepared = Prepared {
        source: String::with_capacity(body.len()),
        anchors: Vec::new(),
    };
    let mut block: Option<(usize, usize)> = None;
    let mut offset = 0usize;

    for (line_idx, line) in body.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += line.len();
        let line_no = line_idx + 1;
        let in_code = code_lines.iter().any(|range| range.contains(&line_no));
        if in_code || line.trim().is_empty() {
            flush_block(body, &mut block, rules, resolver, facts, &mut prepared);
            prepared.source.push_str(line);
            continue;
        }
        block = Some(block.map_or((start, offset), |(block_start, _)| (block_start, offset)));
    }
    flush_block(body, &mut block, rules, resolver, facts, &mut prepared);
    prepared
}

/// Render markdown to HTML with wikilinks resolved through `resolver`.
///
/// Every wikilink occurrence is recorded into `facts`. Code spans, code
/// blocks (fenced or indented) and link destinations are left untouched.
pub fn render_markdown(body: &str, resolver: &dyn NameResolver, facts: &mut LinkFacts) -> String {
    render_markdown_with_rules(body, default_rules(), resolver, facts)
}

/// [`render_markdown`] with an explicit inline rule chain.
pub fn render_markdown_with_rules(
    body: &str,
    rules: &[&dyn InlineRule],
    resolver: &dyn NameResolver,
    facts: &mut LinkFacts,
) -> String {
    render_markdown_shaped(body, rules, resolver, facts, &|_root| {})
}

/// Render with `shape` applied to the parsed document before formatting.
pub(crate) fn render_markdown_shaped(
    body: &str,
    rules: &[&dyn InlineRule],
    resolver: &dyn NameResolver,
    facts: &mut LinkFacts,
    shape: &dyn Fn(Node<'_>),
) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    let options = markdown_options();
    let sanitized: String = body
        .chars()
        .filter(|ch| *ch != PLACEHOLDER_OPEN && *ch != PLACEHOLDER_CLOSE)
        .collect();
    let code_lines = code_block_lines(&sanitized, &options);
    let prepared = prepare(&sanitized, &code_lines, rules, resolver, facts);

    let arena = Arena::new();
    let root = parse_document(&arena, &prepared.source, &options);
    shape(root);
    let mut html = String::new();
    if let Err(err) = format_html(root, &options, &mut html) {
        warn!(error = %err, "markdown formatting failed");
        return String::new();
    }
    if prepared.anchors.is_empty() {
        return html;
    }
    PLACEHOLDER_REGEX
        .replace_all(&html, |caps: &regex::Captures<'_>| {
            caps.get(1)
                .and_then(|m| m.as_str().parse::<usize>().ok())
                .and_then(|index| prepared.anchors.get(index))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note_graph::alias::ResolvedTarget;
    use crate::note_graph::slug::to_slug;

    struct FixedResolver;

    impl NameResolver for FixedResolver {
        fn resolve_target(&self, raw_target: &str) -> ResolvedTarget {
            let normalized = to_slug(raw_target);
            let slug = (normalized == "apple").then(|| normalized.clone());
            ResolvedTarget {
                normalized,
                slug,
                ambiguous_titles: Vec::new(),
            }
        }
    }

    #[test]
    fn test_render_resolves_and_records() {
        let mut facts = LinkFacts::default();
        let html = render_markdown(
            "Eat an [[Apple|apple a day]] and *[[Pear]]*.\n",
            &FixedResolver,
            &mut facts,
        );
        assert!(html.contains(
            "<a href=\"#\" class=\"wikilink\" data-missing=\"false\" data-slug=\"apple\">apple a day</a>"
        ));
        assert!(html.contains("<em><a href=\"#\" class=\"wikilink is-missing\""));
        assert_eq!(facts.edges, vec!["apple".to_string()]);
        assert_eq!(facts.broken.len(), 1);
        assert_eq!(facts.broken[0].raw_target, "Pear");
    }

    #[test]
    fn test_code_is_not_scanned() {
        let mut facts = LinkFacts::default();
        let html = render_markdown(
            "```\n[[Apple]]\n```\n\nInline `[[Apple]]` code.\n",
            &FixedResolver,
            &mut facts,
        );
        assert_eq!(facts, LinkFacts::default());
        assert!(!html.contains("wikilink"));
        assert!(html.contains("[[Apple]]"));
    }

    #[test]
    fn test_indented_code_is_not_scanned() {
        let mut facts = LinkFacts::default();
        let html = render_markdown(
            "Text.\n\n    [[Apple]] in code\n",
            &FixedResolver,
            &mut facts,
        );
        assert_eq!(facts, LinkFacts::default());
        assert!(html.contains("<pre><code>[[Apple]] in code"));
    }

    #[test]
    fn test_mismatched_fence_does_not_close_block() {
        let mut facts = LinkFacts::default();
        let html = render_markdown(
            "```\n~~~\n[[Pear]]\n```\n\n[[Apple]]\n",
            &FixedResolver,
            &mut facts,
        );
        assert_eq!(facts.edges, vec!["apple".to_string()]);
        assert!(facts.broken.is_empty());
        assert!(html.contains("<code>~~~\n[[Pear]]\n</code>"));
        assert!(html.contains("data-slug=\"apple\""));
    }

    #[test]
    fn test_longer_fence_needs_matching_close() {
        let mut facts = LinkFacts::default();
        let _ = render_markdown(
            "````\n```\n[[Pear]]\n````\n\n[[Apple]]\n",
            &FixedResolver,
            &mut facts,
        );
        assert_eq!(facts.edges, vec!["apple".to_string()]);
        assert!(facts.broken.is_empty());
    }

    #[test]
    fn test_link_destination_is_not_scanned() {
        let mut facts = LinkFacts::default();
        let html = render_markdown(
            "[x](http://h/[[Apple]]) [[Apple]]\n",
            &FixedResolver,
            &mut facts,
        );
        assert_eq!(facts.edges, vec!["apple".to_string()]);
        assert!(html.contains("<a href=\"http://h/"));
        assert!(html.contains("\">x</a>"));
        assert!(!html.contains(PLACEHOLDER_OPEN));
    }

    #[test]
    fn test_shape_hook_edits_document() {
        let mut facts = LinkFacts::default();
        let html = render_markdown_shaped(
            "keep\n\ndrop\n",
            default_rules(),
            &FixedResolver,
            &mut facts,
            &|root| {
                if let Some(last) = root.last_child() {
                    last.detach();
                }
            },
        );
        assert_eq!(html, "<p>keep</p>\n");
    }

    #[test]
    fn test_wikilink_does_not_span_paragraphs() {
        let mut facts = LinkFacts::default();
        let html = render_markdown("[[Apple\n\nstill]] open\n", &FixedResolver, &mut facts);
        assert_eq!(facts, LinkFacts::default());
        assert!(html.contains("[[Apple"));
    }

    #[test]
    fn test_wikilink_spans_soft_line_break() {
        let mut facts = LinkFacts::default();
        let _ = render_markdown("a [[Ap\nple]] b\n", &FixedResolver, &mut facts);
        assert_eq!(facts.broken.len(), 1);
        assert_eq!(facts.broken[0].normalized, "ap-ple");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let mut facts = LinkFacts::default();
        let html = render_markdown("<script>x</script> [[Apple]]\n", &FixedResolver, &mut facts);
        assert!(!html.contains("<script>"));
        assert!(html.contains("data-slug=\"apple\""));
    }

    #[test]
    fn test_empty_body_renders_empty() {
        let mut facts = LinkFacts::default();
        assert_eq!(render_markdown("  \n\n", &FixedResolver, &mut facts), "");
    }
}
