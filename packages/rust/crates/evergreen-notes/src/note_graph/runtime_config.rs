use super::excerpt::DEFAULT_EXCERPT_PARAGRAPHS;
use super::loader::DEFAULT_READ_CONCURRENCY;
use super::models::AliasMapMode;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub(crate) const NOTES_DIR_ENV: &str = "EVERGREEN_NOTES_DIR";
pub(crate) const NOTES_REPORT_ENV: &str = "EVERGREEN_NOTES_REPORT";
pub(crate) const NOTES_EXCERPT_PARAGRAPHS_ENV: &str = "EVERGREEN_NOTES_EXCERPT_PARAGRAPHS";
pub(crate) const NOTES_FAILURE_MODE_ENV: &str = "EVERGREEN_NOTES_FAILURE_MODE";

/// Notes directory below the project root when nothing else is configured.
pub const DEFAULT_NOTES_DIR: &str = "notes";
/// Settings file looked up at the project root.
pub const DEFAULT_SETTINGS_FILE: &str = "evergreen.yaml";

static FAILURE_MODE_FROM_ENV: OnceLock<Option<FailureMode>> = OnceLock::new();
static NOTES_CONFIG_FILE_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

/// What a build does when it produces diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    /// Log diagnostics and publish the snapshot.
    #[default]
    Warn,
    /// Fail the build.
    Strict,
}

impl FailureMode {
    /// Parse failure mode aliases from user/runtime input.
    #[must_use]
    pub fn from_alias(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "strict" | "fail" | "1" | "true" => Self::Strict,
            _ => Self::Warn,
        }
    }
}

/// Failure mode from `EVERGREEN_NOTES_FAILURE_MODE`, read once per process.
pub fn failure_mode_from_env() -> Option<FailureMode> {
    *FAILURE_MODE_FROM_ENV.get_or_init(|| {
        std::env::var(NOTES_FAILURE_MODE_ENV)
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| FailureMode::from_alias(&raw))
    })
}

/// Resolved settings for one notes corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesRuntimeConfig {
    /// Corpus root; relative values resolve against the project root.
    pub notes_dir: PathBuf,
    /// Extra directory names skipped during enumeration.
    pub excluded_dirs: Vec<String>,
    /// Paragraphs kept per excerpt.
    pub excerpt_paragraphs: usize,
    /// Published alias conflict table mode.
    pub alias_map_mode: AliasMapMode,
    /// Where the diagnostics report is written after each build.
    pub report_path: Option<PathBuf>,
    /// Behavior on non-empty diagnostics.
    pub failure_mode: FailureMode,
    /// Concurrent note file reads.
    pub read_concurrency: usize,
}

impl Default for NotesRuntimeConfig {
    fn default() -> Self {
        Self {
            notes_dir: PathBuf::from(DEFAULT_NOTES_DIR),
            excluded_dirs: Vec::new(),
            excerpt_paragraphs: DEFAULT_EXCERPT_PARAGRAPHS,
            alias_map_mode: AliasMapMode::default(),
            report_path: None,
            failure_mode: FailureMode::default(),
            read_concurrency: DEFAULT_READ_CONCURRENCY,
        }
    }
}

impl NotesRuntimeConfig {
    /// Config for a corpus directory with every other setting at its default.
    #[must_use]
    pub fn for_notes_dir(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            ..Self::default()
        }
    }

    /// Absolute corpus root for `project_root`.
    #[must_use]
    pub fn notes_root(&self, project_root: &Path) -> PathBuf {
        resolve_against(project_root, &self.notes_dir)
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// CLI/runtime override for the exact settings file path.
///
/// Used by `evergreen --conf <file>`.
///
/// # Errors
///
/// Returns an error when a different override was already set.
pub fn set_notes_config_override(path: PathBuf) -> Result<(), String> {
    let normalized = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    if let Some(existing) = NOTES_CONFIG_FILE_OVERRIDE.get() {
        if existing == &normalized {
            return Ok(());
        }
        return Err(format!(
            "notes config override already set to '{}' (requested '{}')",
            existing.display(),
            normalized.display()
        ));
    }

    NOTES_CONFIG_FILE_OVERRIDE
        .set(normalized)
        .map_err(|_| "failed to set notes config override".to_string())
}

fn read_yaml_file(path: &Path) -> Option<Value> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_yaml::from_str::<Value>(&content).ok()
}

fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    deep_merge(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// Merged settings: project `evergreen.yaml`, then the `--conf` override.
fn merged_notes_settings(project_root: &Path) -> Value {
    let mut merged = Value::Mapping(Mapping::new());
    if let Some(project) = read_yaml_file(&project_root.join(DEFAULT_SETTINGS_FILE)) {
        deep_merge(&mut merged, project);
    }
    if let Some(user) = NOTES_CONFIG_FILE_OVERRIDE.get().and_then(|p| read_yaml_file(p)) {
        deep_merge(&mut merged, user);
    }
    merged
}

fn setting_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn get_setting_value<'a>(settings: &'a Value, dotted_key: &str) -> Option<&'a Value> {
    let mut cursor = settings;
    for segment in dotted_key.split('.') {
        match cursor {
            Value::Mapping(map) => {
                let key = Value::String(segment.to_string());
                cursor = map.get(&key)?;
            }
            _ => return None,
        }
    }
    Some(cursor)
}

fn get_setting_string(settings: &Value, dotted_key: &str) -> Option<String> {
    get_setting_value(settings, dotted_key)
        .and_then(setting_value_to_string)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn get_setting_string_list(settings: &Value, dotted_key: &str) -> Vec<String> {
    let Some(value) = get_setting_value(settings, dotted_key) else {
        return Vec::new();
    };
    match value {
        Value::String(single) => {
            let text = single.trim();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            }
        }
        Value::Sequence(items) => items
            .iter()
            .filter_map(setting_value_to_string)
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_positive_usize(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|value| *value > 0)
}

/// Apply `notes.*` keys of a merged settings document over `config`.
pub(crate) fn apply_settings(config: &mut NotesRuntimeConfig, settings: &Value) {
    if let Some(dir) = get_setting_string(settings, "notes.dir") {
        config.notes_dir = PathBuf::from(dir);
    }
    let excluded = get_setting_string_list(settings, "notes.exclude_dirs");
    if !excluded.is_empty() {
        config.excluded_dirs = excluded;
    }
    if let Some(count) = get_setting_string(settings, "notes.excerpt_paragraphs")
        .as_deref()
        .and_then(parse_positive_usize)
    {
        config.excerpt_paragraphs = count;
    }
    if let Some(mode) = get_setting_string(settings, "notes.alias_map_mode") {
        config.alias_map_mode = AliasMapMode::from_alias(&mode);
    }
    if let Some(report) = get_setting_string(settings, "notes.report_path") {
        config.report_path = Some(PathBuf::from(report));
    }
    if let Some(mode) = get_setting_string(settings, "notes.failure_mode") {
        config.failure_mode = FailureMode::from_alias(&mode);
    }
    if let Some(count) = get_setting_string(settings, "notes.read_concurrency")
        .as_deref()
        .and_then(parse_positive_usize)
    {
        config.read_concurrency = count;
    }
}

/// Apply environment overrides; `lookup` returns the raw variable value.
pub(crate) fn apply_env<F>(config: &mut NotesRuntimeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    if let Some(dir) = non_empty(NOTES_DIR_ENV) {
        config.notes_dir = PathBuf::from(dir.trim());
    }
    if let Some(report) = non_empty(NOTES_REPORT_ENV) {
        config.report_path = Some(PathBuf::from(report.trim()));
    }
    if let Some(count) = non_empty(NOTES_EXCERPT_PARAGRAPHS_ENV)
        .as_deref()
        .and_then(parse_positive_usize)
    {
        config.excerpt_paragraphs = count;
    }
}

/// Resolve notes settings for `project_root`.
///
/// Order:
/// 1) built-in defaults
/// 2) `evergreen.yaml` at the project root, then the `--conf` override file
/// 3) `EVERGREEN_NOTES_*` environment variables
///
/// Relative report paths resolve against the project root.
#[must_use]
pub fn resolve_notes_runtime(project_root: &Path) -> NotesRuntimeConfig {
    let mut config = NotesRuntimeConfig::default();
    apply_settings(&mut config, &merged_notes_settings(project_root));
    apply_env(&mut config, |key| std::env::var(key).ok());
    if let Some(mode) = failure_mode_from_env() {
        config.failure_mode = mode;
    }
    config.report_path = config
        .report_path
        .map(|path| resolve_against(project_root, &path));
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_failure_mode_aliases() {
        for raw in ["strict", "FAIL", " 1 ", "true"] {
            assert_eq!(FailureMode::from_alias(raw), FailureMode::Strict, "{raw}");
        }
        for raw in ["warn", "", "0", "loud"] {
            assert_eq!(FailureMode::from_alias(raw), FailureMode::Warn, "{raw}");
        }
    }

    #[test]
    fn test_settings_layer_reads_dotted_keys() -> Result<(), Box<dyn std::error::Error>> {
        let mut base: Value = serde_yaml::from_str(
            "notes:\n  dir: docs\n  excerpt_paragraphs: 5\n  exclude_dirs: [drafts]\n",
        )?;
        let overlay: Value = serde_yaml::from_str(
            "notes:\n  alias_map_mode: all\n  failure_mode: strict\n  excerpt_paragraphs: 0\n",
        )?;
        deep_merge(&mut base, overlay);

        let mut config = NotesRuntimeConfig::default();
        apply_settings(&mut config, &base);
        assert_eq!(config.notes_dir, PathBuf::from("docs"));
        assert_eq!(config.excluded_dirs, vec!["drafts".to_string()]);
        // Non-positive counts are ignored.
        assert_eq!(config.excerpt_paragraphs, DEFAULT_EXCERPT_PARAGRAPHS);
        assert_eq!(config.alias_map_mode, AliasMapMode::All);
        assert_eq!(config.failure_mode, FailureMode::Strict);
        Ok(())
    }

    #[test]
    fn test_env_layer_overrides_settings() {
        let env: HashMap<&str, &str> = HashMap::from([
            (NOTES_DIR_ENV, "/srv/notes"),
            (NOTES_REPORT_ENV, "report.json"),
            (NOTES_EXCERPT_PARAGRAPHS_ENV, "2"),
        ]);
        let mut config = NotesRuntimeConfig::for_notes_dir("docs");
        apply_env(&mut config, |key| env.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.notes_dir, PathBuf::from("/srv/notes"));
        assert_eq!(config.report_path, Some(PathBuf::from("report.json")));
        assert_eq!(config.excerpt_paragraphs, 2);
        assert_eq!(
            config.notes_root(Path::new("/project")),
            PathBuf::from("/srv/notes")
        );
    }

    #[test]
    fn test_resolve_reads_project_settings_file() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempfile::TempDir::new()?;
        std::fs::write(
            tmp.path().join(DEFAULT_SETTINGS_FILE),
            "notes:\n  dir: vault\n  report_path: out/diag.json\n  read_concurrency: 4\n",
        )?;
        let config = resolve_notes_runtime(tmp.path());
        if std::env::var(NOTES_DIR_ENV).is_err() {
            assert_eq!(config.notes_root(tmp.path()), tmp.path().join("vault"));
        }
        if std::env::var(NOTES_REPORT_ENV).is_err() {
            assert_eq!(config.report_path, Some(tmp.path().join("out/diag.json")));
        }
        assert_eq!(config.read_concurrency, 4);
        Ok(())
    }
}
