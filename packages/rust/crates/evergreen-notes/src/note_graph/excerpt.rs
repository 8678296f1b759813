//! Leading-paragraph previews rendered through the wikilink pipeline.

use super::alias::NameResolver;
use super::markup::{LinkFacts, default_rules, render_markdown_shaped};
use comrak::Node;
use comrak::nodes::NodeValue;

/// Paragraphs kept when no count is configured.
pub const DEFAULT_EXCERPT_PARAGRAPHS: usize = 3;

fn strip_images(root: Node<'_>) {
    let images: Vec<Node<'_>> = root
        .descendants()
        .filter(|node| matches!(node.data().value, NodeValue::Image(_)))
        .collect();
    for image in images {
        image.detach();
    }
}

fn has_visible_content(block: Node<'_>) -> bool {
    block.descendants().any(|node| match &node.data().value {
        NodeValue::Text(text) => !text.trim().is_empty(),
        NodeValue::Paragraph | NodeValue::SoftBreak | NodeValue::LineBreak => false,
        _ => true,
    })
}

/// Drop images, then keep the first `paragraphs` top-level blocks that still
/// show something.
fn keep_leading_blocks(root: Node<'_>, paragraphs: usize) {
    strip_images(root);
    let blocks: Vec<Node<'_>> = root.children().collect();
    let mut kept = 0usize;
    for block in blocks {
        if kept < paragraphs && has_visible_content(block) {
            kept += 1;
        } else {
            block.detach();
        }
    }
}

/// Rendered HTML preview of the first `paragraphs` blocks of `body`.
///
/// Blocks are the top-level blocks of the parsed document, so a fenced code
/// block stays whole even when it contains blank lines. Images are removed
/// after parsing; a block left empty is not counted. Wikilinks resolve
/// through `resolver`; their facts are discarded.
#[must_use]
pub fn render_excerpt(body: &str, paragraphs: usize, resolver: &dyn NameResolver) -> String {
    let mut discarded = LinkFacts::default();
    render_markdown_shaped(body, default_rules(), resolver, &mut discarded, &|root| {
        keep_leading_blocks(root, paragraphs);
    })
}
