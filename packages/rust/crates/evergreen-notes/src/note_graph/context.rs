//! Memoized index builds with explicit invalidation.

use super::index::NoteIndex;
use super::runtime_config::NotesRuntimeConfig;
use crate::error::NotesError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct CachedBuild {
    generation: u64,
    index: Arc<NoteIndex>,
}

/// Owns the current snapshot of one corpus.
///
/// Concurrent `get_or_build` callers share a single in-flight build.
#[derive(Debug)]
pub struct BuildContext {
    root: PathBuf,
    config: NotesRuntimeConfig,
    generation: AtomicU64,
    cached: Mutex<Option<CachedBuild>>,
}

impl BuildContext {
    /// Context for the corpus at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: NotesRuntimeConfig) -> Self {
        Self {
            root: root.into(),
            config,
            generation: AtomicU64::new(0),
            cached: Mutex::new(None),
        }
    }

    /// Corpus root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build settings.
    #[must_use]
    pub fn config(&self) -> &NotesRuntimeConfig {
        &self.config
    }

    /// Current snapshot, building it first when missing or invalidated.
    ///
    /// # Errors
    ///
    /// Propagates build errors; nothing is cached on failure.
    pub async fn get_or_build(&self) -> Result<Arc<NoteIndex>, NotesError> {
        let mut cached = self.cached.lock().await;
        let generation = self.generation.load(Ordering::Acquire);
        if let Some(current) = cached.as_ref().filter(|c| c.generation == generation) {
            return Ok(Arc::clone(&current.index));
        }

        debug!(
            "building note index for {} (generation {generation})",
            self.root.display()
        );
        *cached = None;
        let index = Arc::new(NoteIndex::build(&self.root, &self.config).await?);
        *cached = Some(CachedBuild {
            generation,
            index: Arc::clone(&index),
        });
        Ok(index)
    }

    /// Discard the current snapshot; the next request rebuilds.
    pub fn invalidate(&self) {
        let previous = self.generation.fetch_add(1, Ordering::AcqRel);
        debug!(
            "note index invalidated for {} (generation {})",
            self.root.display(),
            previous + 1
        );
    }

    /// Generation the next build will be tagged with.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
