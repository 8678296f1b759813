//! Canonical slug normalization and collision-free assignment.

use super::models::Note;
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Separator used between words and before duplicate suffixes.
pub const SLUG_SEPARATOR: char = '-';

/// Base used when override, title and file stem all normalize to nothing.
pub const FALLBACK_SLUG_BASE: &str = "note";

fn transliterate(ch: char) -> Option<&'static str> {
    let mapped = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "c",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sh",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        'є' => "ye",
        'і' => "i",
        'ї' => "yi",
        'ґ' => "g",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'đ' => "d",
        'ł' => "l",
        'þ' => "th",
        _ => return None,
    };
    Some(mapped)
}

/// Normalize any name into slug form.
///
/// Lowercases, transliterates Cyrillic and a few Latin ligatures, strips
/// remaining diacritics, and collapses every run of non-ASCII-alphanumeric
/// characters into a single separator. Leading and trailing separators are
/// trimmed, so the result may be empty.
#[must_use]
pub fn to_slug(name: &str) -> String {
    let mut latin = String::with_capacity(name.len());
    for ch in name.chars().flat_map(char::to_lowercase) {
        match transliterate(ch) {
            Some(mapped) => latin.push_str(mapped),
            None => latin.push(ch),
        }
    }

    let mut out = String::with_capacity(latin.len());
    let mut pending_separator = false;
    for ch in latin.nfkd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push(SLUG_SEPARATOR);
            }
            pending_separator = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

/// Base candidate for one note: override, else title, else file stem.
///
/// A source that normalizes to nothing is skipped.
#[must_use]
pub fn base_candidate(note: &Note) -> String {
    note.override_slug
        .iter()
        .map(String::as_str)
        .chain([note.title.as_str(), note.stem.as_str()])
        .map(to_slug)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_else(|| FALLBACK_SLUG_BASE.to_string())
}

/// Assign one canonical slug per base candidate, in the given order.
///
/// The first claimant of a base keeps it bare; the Nth receives `base-N`.
/// When `base-N` is itself taken (a note literally titled `apple-2`), N keeps
/// increasing until the slug is free.
#[must_use]
pub fn assign_slugs(base_candidates: &[String]) -> Vec<String> {
    let mut count_by_base: HashMap<&str, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::with_capacity(base_candidates.len());
    let mut out: Vec<String> = Vec::with_capacity(base_candidates.len());

    for base in base_candidates {
        let count = count_by_base.entry(base.as_str()).or_insert(0);
        *count += 1;
        let mut slug = if *count == 1 {
            base.clone()
        } else {
            format!("{base}{SLUG_SEPARATOR}{count}")
        };
        while taken.contains(&slug) {
            *count += 1;
            slug = format!("{base}{SLUG_SEPARATOR}{count}");
        }
        taken.insert(slug.clone());
        out.push(slug);
    }
    out
}
