//! Diagnostics publication: log summary, report file, failure mode.

use super::models::Diagnostics;
use super::runtime_config::FailureMode;
use crate::error::NotesError;
use std::path::Path;
use tracing::{debug, warn};

/// Write the diagnostics report as pretty JSON.
///
/// Failures are logged and swallowed; a report never fails a build.
pub async fn write_diagnostics_report(path: &Path, diagnostics: &Diagnostics) {
    let payload = match serde_json::to_string_pretty(diagnostics) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("failed to serialize notes diagnostics report: {err}");
            return;
        }
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = tokio::fs::create_dir_all(parent).await {
            warn!(
                "failed to create report directory {}: {err}",
                parent.display()
            );
            return;
        }
    }
    match tokio::fs::write(path, payload).await {
        Ok(()) => debug!("wrote notes diagnostics report to {}", path.display()),
        Err(err) => warn!(
            "failed to write notes diagnostics report {}: {err}",
            path.display()
        ),
    }
}

/// Log every diagnostic at `warn`.
pub fn log_diagnostics(diagnostics: &Diagnostics) {
    for link in &diagnostics.broken_links {
        warn!(
            "broken wikilink in '{}' ({}): [[{}]] -> {}",
            link.from_title, link.from_slug, link.target, link.target_slug
        );
    }
    for conflict in &diagnostics.alias_conflicts {
        warn!(
            "ambiguous name '{}' claimed by {}; resolving to {}",
            conflict.alias,
            conflict.slugs.join(", "),
            conflict.slugs.first().map_or("", String::as_str)
        );
    }
}

/// Fail in strict mode when any diagnostic exists.
///
/// # Errors
///
/// Returns [`NotesError::StrictDiagnostics`] with both counts.
pub fn enforce_failure_mode(mode: FailureMode, diagnostics: &Diagnostics) -> Result<(), NotesError> {
    if mode == FailureMode::Strict && !diagnostics.is_empty() {
        return Err(NotesError::StrictDiagnostics {
            broken_links: diagnostics.broken_links.len(),
            alias_conflicts: diagnostics.alias_conflicts.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note_graph::models::{AliasConflict, BrokenLink};

    fn sample() -> Diagnostics {
        Diagnostics {
            broken_links: vec![BrokenLink {
                from_slug: "a".to_string(),
                from_title: "A".to_string(),
                target: "Gone".to_string(),
                target_slug: "gone".to_string(),
            }],
            alias_conflicts: vec![AliasConflict {
                alias: "intro".to_string(),
                slugs: vec!["a".to_string(), "b".to_string()],
            }],
        }
    }

    #[test]
    fn test_strict_mode_reports_counts() {
        assert!(enforce_failure_mode(FailureMode::Warn, &sample()).is_ok());
        assert!(enforce_failure_mode(FailureMode::Strict, &Diagnostics::default()).is_ok());
        let err = enforce_failure_mode(FailureMode::Strict, &sample());
        assert!(matches!(
            err,
            Err(NotesError::StrictDiagnostics {
                broken_links: 1,
                alias_conflicts: 1
            })
        ));
        assert_eq!(
            err.map_err(|e| e.to_string()),
            Err("strict mode: 1 broken link(s), 1 alias conflict(s)".to_string())
        );
    }

    #[tokio::test]
    async fn test_report_is_written_as_camel_case_json() -> Result<(), Box<dyn std::error::Error>>
    {
        let tmp = tempfile::TempDir::new()?;
        let path = tmp.path().join("nested/diagnostics.json");
        write_diagnostics_report(&path, &sample()).await;
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(value["brokenLinks"][0]["targetSlug"], "gone");
        assert_eq!(value["aliasConflicts"][0]["slugs"][1], "b");
        Ok(())
    }

    #[tokio::test]
    async fn test_report_failure_is_swallowed() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempfile::TempDir::new()?;
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x")?;
        write_diagnostics_report(&blocker.join("report.json"), &sample()).await;
        assert!(!blocker.join("report.json").exists());
        Ok(())
    }
}
