//! Integration tests for memoized builds, invalidation and failure modes.

use evergreen_notes::{BuildContext, FailureMode, NotesError, NotesRuntimeConfig};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn context_for(root: &Path) -> BuildContext {
    BuildContext::new(root, NotesRuntimeConfig::for_notes_dir(root))
}

#[tokio::test]
async fn test_snapshot_is_served_until_invalidated() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("a.md"), "[[b]]")?;
    write_file(&tmp.path().join("b.md"), "b")?;
    let context = context_for(tmp.path());

    let first = context.get_or_build().await?;
    write_file(&tmp.path().join("c.md"), "[[a]]")?;
    let cached = context.get_or_build().await?;
    assert!(Arc::ptr_eq(&first, &cached));
    assert_eq!(cached.manifest().len(), 2);

    context.invalidate();
    let rebuilt = context.get_or_build().await?;
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(rebuilt.manifest().len(), 3);
    assert_eq!(rebuilt.graph().incoming["a"], vec!["c"]);
    assert_eq!(context.generation(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests_share_one_build() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    for idx in 0..20 {
        write_file(
            &tmp.path().join(format!("note-{idx:02}.md")),
            &format!("[[note-{:02}]]", (idx + 1) % 20),
        )?;
    }
    let context = Arc::new(context_for(tmp.path()));

    let (left, right, third) = tokio::join!(
        context.get_or_build(),
        context.get_or_build(),
        context.get_or_build()
    );
    let (left, right, third) = (left?, right?, third?);
    assert!(Arc::ptr_eq(&left, &right));
    assert!(Arc::ptr_eq(&left, &third));
    assert_eq!(left.stats().links_in_graph, 20);
    Ok(())
}

#[tokio::test]
async fn test_strict_mode_fails_and_caches_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("a.md"), "[[Missing]] [[Also Missing]]")?;
    let mut config = NotesRuntimeConfig::for_notes_dir(tmp.path());
    config.failure_mode = FailureMode::Strict;
    let context = BuildContext::new(tmp.path(), config);

    let err = context.get_or_build().await;
    assert!(matches!(
        err,
        Err(NotesError::StrictDiagnostics {
            broken_links: 2,
            alias_conflicts: 0
        })
    ));

    write_file(&tmp.path().join("a.md"), "fixed")?;
    let index = context.get_or_build().await?;
    assert!(index.diagnostics().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_warn_mode_writes_report_and_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let notes = tmp.path().join("notes");
    write_file(&notes.join("a.md"), "[[Gone]]")?;
    let report = tmp.path().join("out/diagnostics.json");
    let mut config = NotesRuntimeConfig::for_notes_dir(&notes);
    config.report_path = Some(report.clone());
    let context = BuildContext::new(&notes, config);

    let index = context.get_or_build().await?;
    assert_eq!(index.diagnostics().broken_links.len(), 1);

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report)?)?;
    assert_eq!(written["brokenLinks"][0]["fromSlug"], "a");
    assert_eq!(written["brokenLinks"][0]["target"], "Gone");
    assert!(written["aliasConflicts"].as_array().is_some_and(Vec::is_empty));
    Ok(())
}

#[tokio::test]
async fn test_invalid_utf8_note_is_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("good.md"), "[[bad]]")?;
    fs::write(tmp.path().join("bad.md"), [0xff, 0xfe])?;
    let context = context_for(tmp.path());

    let index = context.get_or_build().await?;
    let slugs: Vec<&str> = index
        .manifest()
        .iter()
        .map(|entry| entry.slug.as_str())
        .collect();
    assert_eq!(slugs, vec!["good"]);
    assert_eq!(index.diagnostics().broken_links.len(), 1);
    assert_eq!(index.diagnostics().broken_links[0].target, "bad");
    Ok(())
}

#[tokio::test]
async fn test_invalidation_during_build_forces_fresh_build()
-> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    write_file(&tmp.path().join("a.md"), "[[b]]")?;
    write_file(&tmp.path().join("b.md"), "b")?;
    let context = context_for(tmp.path());

    let (in_flight, edited) = tokio::join!(context.get_or_build(), async {
        write_file(&tmp.path().join("c.md"), "[[a]]")?;
        context.invalidate();
        Ok::<(), Box<dyn std::error::Error>>(())
    });
    edited?;
    let in_flight = in_flight?;
    assert_eq!(context.generation(), 1);

    let fresh = context.get_or_build().await?;
    assert!(!Arc::ptr_eq(&in_flight, &fresh));
    assert_eq!(fresh.manifest().len(), 3);
    assert_eq!(fresh.graph().incoming["a"], vec!["c"]);

    let served = context.get_or_build().await?;
    assert!(Arc::ptr_eq(&fresh, &served));
    Ok(())
}
