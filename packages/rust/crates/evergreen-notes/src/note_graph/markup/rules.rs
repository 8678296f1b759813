//! Ordered inline span rules applied ahead of markdown inline parsing.
//!
//! Each rule sees the source plus an immutable `[pos, max)` window and either
//! declines or returns tokens with the cursor position after its span. Rules
//! run in order at every position; the first match wins. When no rule
//! matches, one character is emitted as plain text and scanning continues.

use super::wikilink::WikiLinkRule;

/// Token produced by the inline rule layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineToken<'a> {
    /// Source text handed to the markdown renderer unchanged.
    Text(&'a str),
    /// `[[target|label]]` occurrence.
    WikiLink {
        /// Target name-form, trimmed.
        target: &'a str,
        /// Display label, trimmed; the full content when no `|` is present.
        label: &'a str,
    },
}

/// Successful rule match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanMatch<'a> {
    /// Tokens covering the matched span.
    pub tokens: Vec<InlineToken<'a>>,
    /// Byte offset right after the span.
    pub end: usize,
}

/// One inline span recognizer.
pub trait InlineRule: Sync {
    /// Stable rule name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Try to match a span starting exactly at `pos`, never reading past `max`.
    fn try_match<'a>(&self, src: &'a str, pos: usize, max: usize) -> Option<SpanMatch<'a>>;
}

/// Backslash escape of an ASCII punctuation character, kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeRule;

impl InlineRule for EscapeRule {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn try_match<'a>(&self, src: &'a str, pos: usize, max: usize) -> Option<SpanMatch<'a>> {
        let bytes = src.as_bytes();
        if bytes.get(pos) != Some(&b'\\') || pos + 1 >= max {
            return None;
        }
        if !bytes[pos + 1].is_ascii_punctuation() {
            return None;
        }
        Some(SpanMatch {
            tokens: vec![InlineToken::Text(&src[pos..pos + 2])],
            end: pos + 2,
        })
    }
}

/// Backtick code span, kept verbatim so nothing inside is reinterpreted.
///
/// An opening run without a matching closing run is consumed as literal
/// text so that its tail cannot open a shorter span.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeSpanRule;

impl InlineRule for CodeSpanRule {
    fn name(&self) -> &'static str {
        "code_span"
    }

    fn try_match<'a>(&self, src: &'a str, pos: usize, max: usize) -> Option<SpanMatch<'a>> {
        let bytes = src.as_bytes();
        if bytes.get(pos) != Some(&b'`') {
            return None;
        }
        let run = bytes[pos..max].iter().take_while(|b| **b == b'`').count();
        let mut cursor = pos + run;
        while cursor < max {
            if bytes[cursor] != b'`' {
                cursor += 1;
                continue;
            }
            let closing = bytes[cursor..max].iter().take_while(|b| **b == b'`').count();
            if closing == run {
                let end = cursor + closing;
                return Some(SpanMatch {
                    tokens: vec![InlineToken::Text(&src[pos..end])],
                    end,
                });
            }
            cursor += closing;
        }
        Some(SpanMatch {
            tokens: vec![InlineToken::Text(&src[pos..pos + run])],
            end: pos + run,
        })
    }
}

/// Link destinations and autolinks, kept verbatim.
///
/// Covers inline `](destination "title")` tails, `<scheme:...>` autolinks and
/// bare `http://`, `https://` and `www.` URLs, so brackets inside a URL are
/// never read as a wikilink.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkDestinationRule;

fn inline_destination_end(src: &str, pos: usize, max: usize) -> Option<usize> {
    if !src[pos..max].starts_with("](") {
        return None;
    }
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut cursor = pos + 1;
    while cursor < max {
        match bytes[cursor] {
            b'\\' => {
                cursor += 2;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(cursor + 1);
                }
            }
            _ => {}
        }
        cursor += 1;
    }
    None
}

fn angle_autolink_end(src: &str, pos: usize, max: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    if bytes.get(pos) != Some(&b'<') {
        return None;
    }
    let scheme_start = pos + 1;
    let scheme_len = bytes[scheme_start..max]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
        .count();
    let colon = scheme_start + scheme_len;
    if !(2..=32).contains(&scheme_len)
        || !bytes[scheme_start].is_ascii_alphabetic()
        || colon >= max
        || bytes[colon] != b':'
    {
        return None;
    }
    let rest = colon + 1;
    let stop = bytes[rest..max]
        .iter()
        .position(|b| matches!(b, b'>' | b'<') || b.is_ascii_whitespace())?;
    (bytes[rest + stop] == b'>').then_some(rest + stop + 1)
}

fn bare_url_end(src: &str, pos: usize, max: usize) -> Option<usize> {
    let window = &src[pos..max];
    if !["https://", "http://", "www."]
        .iter()
        .any(|prefix| window.starts_with(prefix))
    {
        return None;
    }
    let at_boundary = src[..pos]
        .chars()
        .next_back()
        .is_none_or(|ch| ch.is_whitespace() || matches!(ch, '*' | '_' | '~' | '('));
    if !at_boundary {
        return None;
    }
    let len = window
        .find(|ch: char| ch.is_whitespace() || ch == '<')
        .unwrap_or(window.len());
    Some(pos + len)
}

impl InlineRule for LinkDestinationRule {
    fn name(&self) -> &'static str {
        "link_destination"
    }

    fn try_match<'a>(&self, src: &'a str, pos: usize, max: usize) -> Option<SpanMatch<'a>> {
        let end = inline_destination_end(src, pos, max)
            .or_else(|| angle_autolink_end(src, pos, max))
            .or_else(|| bare_url_end(src, pos, max))?;
        Some(SpanMatch {
            tokens: vec![InlineToken::Text(&src[pos..end])],
            end,
        })
    }
}

static DEFAULT_RULES: [&dyn InlineRule; 4] = [
    &EscapeRule,
    &CodeSpanRule,
    &LinkDestinationRule,
    &WikiLinkRule,
];

/// Default rule chain: escapes, code spans, link destinations, wikilinks.
#[must_use]
pub fn default_rules() -> &'static [&'static dyn InlineRule] {
    &DEFAULT_RULES
}

/// Run `rules` over `src[start..max]`.
#[must_use]
pub fn tokenize_inline<'a>(
    src: &'a str,
    start: usize,
    max: usize,
    rules: &[&dyn InlineRule],
) -> Vec<InlineToken<'a>> {
    let mut tokens: Vec<InlineToken<'a>> = Vec::new();
    let mut text_start = start;
    let mut pos = start;

    'scan: while pos < max {
        for rule in rules {
            if let Some(matched) = rule.try_match(src, pos, max) {
                if text_start < pos {
                    tokens.push(InlineToken::Text(&src[text_start..pos]));
                }
                tokens.extend(matched.tokens);
                pos = matched.end.max(pos + 1).min(max);
                text_start = pos;
                continue 'scan;
            }
        }
        pos += src[pos..].chars().next().map_or(1, char::len_utf8);
    }
    if text_start < max {
        tokens.push(InlineToken::Text(&src[text_start..max]));
    }
    tokens
}
