use crate::note_graph::models::NoteFrontmatter;
use crate::note_graph::patterns::compile_regex;
use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

static FRONTMATTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?(?:---|\.\.\.)[ \t]*(?:\r?\n|\z)")
});

const OVERRIDE_KEYS: [&str; 3] = ["slug", "url", "permalink"];

fn scalar_to_string(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn extract_aliases(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

/// Split a leading front-matter block from `content`.
///
/// The block is removed from the body whenever its delimiters are present,
/// even if the YAML inside fails to parse.
pub(super) fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(caps) = FRONTMATTER_REGEX.captures(content) else {
        return (None, content);
    };
    let body = caps.get(0).map_or(content, |m| &content[m.end()..]);
    let raw = caps.get(1).map_or("", |m| m.as_str());
    (Some(raw), body)
}

/// Narrow a raw YAML block into [`NoteFrontmatter`].
///
/// Malformed YAML or a document that is not a mapping yields the default
/// (empty) front-matter.
pub(super) fn narrow_frontmatter(raw: &str) -> NoteFrontmatter {
    let Ok(Value::Mapping(mapping)) = serde_yaml::from_str::<Value>(raw) else {
        return NoteFrontmatter::default();
    };

    let mut out = NoteFrontmatter::default();
    let mut overrides: [Option<String>; 3] = [None, None, None];
    for (key, value) in mapping {
        let Some(key) = scalar_to_string(&key) else {
            continue;
        };
        match key.as_str() {
            "title" => out.title = scalar_to_string(&value),
            "aliases" => out.aliases = extract_aliases(&value),
            other => {
                if let Some(slot) = OVERRIDE_KEYS.iter().position(|name| *name == other) {
                    overrides[slot] = scalar_to_string(&value);
                } else {
                    out.extra.insert(key, value);
                }
            }
        }
    }
    out.slug_override = overrides.into_iter().flatten().next();
    out
}

/// Parse front-matter and return it with the remaining body.
pub(super) fn parse_frontmatter(content: &str) -> (NoteFrontmatter, &str) {
    match split_frontmatter(content) {
        (Some(raw), body) => (narrow_frontmatter(raw), body),
        (None, body) => (NoteFrontmatter::default(), body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frontmatter_recognized_fields() {
        let content = "---\ntitle: \" Apple \"\naliases:\n  - Fruit\n  - ''\nslug: custom-id\ntags: [a]\n---\nBody text\n";
        let (fm, body) = parse_frontmatter(content);
        assert_eq!(fm.title.as_deref(), Some("Apple"));
        assert_eq!(fm.aliases, vec!["Fruit".to_string()]);
        assert_eq!(fm.slug_override.as_deref(), Some("custom-id"));
        assert!(fm.extra.contains_key("tags"));
        assert_eq!(body, "Body text\n");
    }

    #[test]
    fn test_single_string_alias_and_override_precedence() {
        let content = "---\naliases: Intro\npermalink: /p/x\nurl: /u/x\n---\n";
        let (fm, body) = parse_frontmatter(content);
        assert_eq!(fm.aliases, vec!["Intro".to_string()]);
        assert_eq!(fm.slug_override.as_deref(), Some("/u/x"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_malformed_yaml_degrades_to_empty_metadata() {
        let content = "---\ntitle: [unclosed\n---\nStill body\n";
        let (fm, body) = parse_frontmatter(content);
        assert_eq!(fm, NoteFrontmatter::default());
        assert_eq!(body, "Still body\n");
    }

    #[test]
    fn test_non_mapping_frontmatter_is_ignored() {
        let (fm, body) = parse_frontmatter("---\n- a\n- b\n---\ntext");
        assert_eq!(fm, NoteFrontmatter::default());
        assert_eq!(body, "text");
    }

    #[test]
    fn test_empty_block_and_crlf() {
        let (fm, body) = parse_frontmatter("---\n---\nhello");
        assert_eq!(fm, NoteFrontmatter::default());
        assert_eq!(body, "hello");

        let (fm, body) = parse_frontmatter("---\r\ntitle: Win\r\n---\r\nbody");
        assert_eq!(fm.title.as_deref(), Some("Win"));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_absent_or_unclosed_frontmatter_keeps_content() {
        let (fm, body) = parse_frontmatter("# Heading\n\ntext");
        assert_eq!(fm, NoteFrontmatter::default());
        assert_eq!(body, "# Heading\n\ntext");

        let (_, body) = parse_frontmatter("---\nnot closed\n");
        assert_eq!(body, "---\nnot closed\n");
    }

    #[test]
    fn test_numeric_title_is_stringified() {
        let (fm, _) = parse_frontmatter("---\ntitle: 1984\n---\n");
        assert_eq!(fm.title.as_deref(), Some("1984"));
    }
}
