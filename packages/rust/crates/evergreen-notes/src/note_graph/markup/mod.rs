//! Markdown rendering with wikilink resolution.

mod render;
mod rules;
mod wikilink;

pub(crate) use render::render_markdown_shaped;
pub use render::{render_markdown, render_markdown_with_rules};
pub use rules::{
    CodeSpanRule, EscapeRule, InlineRule, InlineToken, LinkDestinationRule, SpanMatch,
    default_rules, tokenize_inline,
};
pub use wikilink::{LinkFacts, UnresolvedLink, WikiLinkRule, render_wikilink_anchor};
