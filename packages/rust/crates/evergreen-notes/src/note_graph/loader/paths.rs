use std::path::Path;

pub(super) fn normalize_slashes(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// Whether the file is a markdown note (`.md`, any case).
#[must_use]
pub fn is_supported_note(path: &Path) -> bool {
    path.extension()
        .and_then(|v| v.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Forward-slash path of `path` relative to `root`, or `None` when outside it.
pub(super) fn relative_note_path(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let out = normalize_slashes(&rel.to_string_lossy())
        .trim_matches('/')
        .to_string();
    if out.is_empty() { None } else { Some(out) }
}

pub(super) fn note_stem(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().trim().to_string();
    if stem.is_empty() { None } else { Some(stem) }
}

fn normalize_excluded_dir(name: &str) -> Option<String> {
    let trimmed = name.trim().trim_matches('/').to_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed)
}

pub(super) fn normalize_excluded_dirs(excluded_dirs: &[String]) -> Vec<String> {
    let mut out: Vec<String> = excluded_dirs
        .iter()
        .filter_map(|name| normalize_excluded_dir(name))
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Skip hidden entries and excluded directory names below `root`.
///
/// Hidden means any path component starting with `.`; the root itself is
/// never skipped.
pub(super) fn should_skip_entry(
    path: &Path,
    is_dir: bool,
    root: &Path,
    excluded_dirs: &[String],
) -> bool {
    let Some(relative) = relative_note_path(path, root) else {
        return false;
    };

    let components: Vec<&str> = relative.split('/').filter(|v| !v.is_empty()).collect();
    if components.iter().any(|component| component.starts_with('.')) {
        return true;
    }
    if excluded_dirs.is_empty() {
        return false;
    }

    let dir_components = if is_dir {
        &components[..]
    } else {
        &components[..components.len().saturating_sub(1)]
    };
    dir_components
        .iter()
        .any(|component| excluded_dirs.iter().any(|dir| dir == &component.to_lowercase()))
}
