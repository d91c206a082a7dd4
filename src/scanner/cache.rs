use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::object::FilesystemObject;

/// Last known node per absolute path, used to skip checksum work for files
/// that did not change.
///
/// Constructed once at startup and shared through `Arc`. Every access goes
/// through one lock; the cache is an optimisation, never a source of truth.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: Mutex<HashMap<PathBuf, Arc<FilesystemObject>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<FilesystemObject>> {
        self.entries.lock().get(path).cloned()
    }

    pub fn put(&self, fso: Arc<FilesystemObject>) {
        self.entries.lock().insert(fso.path.clone(), fso);
    }

    pub fn remove(&self, path: &Path) {
        self.entries.lock().remove(path);
    }

    pub fn merge(&self, other: HashMap<PathBuf, Arc<FilesystemObject>>) {
        self.entries.lock().extend(other);
    }

    /// Unordered snapshot of every cached node.
    pub fn all_values(&self) -> Vec<Arc<FilesystemObject>> {
        self.entries.lock().values().cloned().collect()
    }

    /// Return the cached node for `path` if its size and modification time
    /// still match what was just read from disk.
    pub fn lookup_fresh(
        &self,
        path: &Path,
        size: u64,
        mod_time: DateTime<Utc>,
    ) -> Option<Arc<FilesystemObject>> {
        let fresh = self
            .get(path)
            .filter(|c| !c.is_dir && !c.root && c.is_equal(path, size, mod_time));
        match fresh {
            Some(hit) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(hit)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Push every regular file of a freshly cleaned tree and forget entries
    /// below its root that the tree no longer holds.
    ///
    /// Returns the number of files now cached for this root.
    pub fn sync_tree(&self, root: &FilesystemObject) -> usize {
        let fresh: HashMap<PathBuf, Arc<FilesystemObject>> =
            root.regular_files().into_iter().map(|f| (f.path.clone(), f)).collect();
        let count = fresh.len();
        let seen: HashSet<PathBuf> = fresh.keys().cloned().collect();

        let mut entries = self.entries.lock();
        entries.extend(fresh);
        let before = entries.len();
        entries.retain(|path, _| !path.starts_with(&root.path) || seen.contains(path));
        let pruned = before - entries.len();
        drop(entries);

        if pruned > 0 {
            tracing::debug!(root = %root.path.display(), pruned, "dropped vanished files from cache");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
