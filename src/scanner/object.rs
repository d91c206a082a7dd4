use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use super::cache::ContentCache;
use super::content;
use crate::error::{FsError, FsResult};

#[cfg(unix)]
const S_IFMT: u32 = 0o170000;
#[cfg(unix)]
const S_IFREG: u32 = 0o100000;

/// In-memory snapshot of one disk entry and, for directories, its children.
///
/// Nodes are shared as `Arc<FilesystemObject>` between the tree, the content
/// cache and listings. Only the child list is mutable; it is guarded by a
/// per-node lock so sibling subtrees can be rebuilt independently.
#[derive(Debug, Serialize)]
pub struct FilesystemObject {
    pub path: PathBuf,
    pub content_type: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
    /// SHA-256 of the content, regular files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(skip)]
    pub mode: u32,
    #[serde(skip)]
    pub root: bool,
    #[serde(skip)]
    children: Mutex<Vec<Arc<FilesystemObject>>>,
}

impl FilesystemObject {
    /// Build a node from already fetched metadata.
    ///
    /// Regular files get their digest and content type computed here.
    pub fn new(path: &Path, info: &Metadata, root: bool) -> FsResult<Self> {
        let mod_time = info
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| FsError::io("read modification time of", path, e))?;
        let mut fso = FilesystemObject {
            path: path.to_path_buf(),
            content_type: String::new(),
            size: info.len(),
            mod_time,
            is_dir: info.is_dir(),
            hash: None,
            mode: raw_mode(info),
            root,
            children: Mutex::new(Vec::new()),
        };

        if fso.is_regular() {
            fso.content_type = content::detect_content_type(path).map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "couldn't detect content-type");
                FsError::io("detect content-type of", path, e)
            })?;
            fso.hash = Some(content::sha256_file(path).map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "couldn't compute checksum");
                FsError::io("checksum", path, e)
            })?);
        }
        Ok(fso)
    }

    /// Stat a path and build a node from it.
    pub fn from_path(path: &Path, root: bool) -> FsResult<Arc<Self>> {
        let info = stat(path)?;
        tracing::debug!(path = %path.display(), "creating new object");
        Ok(Arc::new(Self::new(path, &info, root)?))
    }

    /// Stat a path and reuse the cached node when it is still up to date.
    ///
    /// Only regular files are served from the cache; directories always get a
    /// fresh node because their child list is scan state.
    pub fn from_path_cached(path: &Path, cache: &ContentCache) -> FsResult<Arc<Self>> {
        let info = stat(path)?;
        if info.is_file() {
            let mod_time = info
                .modified()
                .map(DateTime::<Utc>::from)
                .map_err(|e| FsError::io("read modification time of", path, e))?;
            if let Some(hit) = cache.lookup_fresh(path, info.len(), mod_time) {
                return Ok(hit);
            }
        }
        tracing::debug!(path = %path.display(), "creating new object");
        Ok(Arc::new(Self::new(path, &info, false)?))
    }

    pub fn is_regular(&self) -> bool {
        !self.is_dir && is_regular_mode(self.mode)
    }

    /// Quick check whether this node still describes what is on disk.
    pub fn is_equal(&self, path: &Path, size: u64, mod_time: DateTime<Utc>) -> bool {
        self.path == path && self.size == size && self.mod_time == mod_time
    }

    /// Snapshot of the current child list.
    pub fn children(&self) -> Vec<Arc<FilesystemObject>> {
        self.children.lock().clone()
    }

    /// Recursively rebuild the child list from disk.
    pub fn scan(&self, cache: &ContentCache) -> FsResult<()> {
        if !self.is_dir {
            return Err(FsError::NotDirectory(self.path.clone()));
        }
        let mut children = self.children.lock();

        if self.root {
            tracing::info!(path = %self.path.display(), "scanning directory");
        } else {
            tracing::debug!(path = %self.path.display(), "scanning directory");
        }

        children.clear();

        let entries = fs::read_dir(&self.path).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "couldn't read directory");
            FsError::io("read directory", &self.path, e)
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| FsError::io("read directory", &self.path, e))?;
            let path = entry.path();

            // Following directory links could turn the tree into a cycle.
            if entry.file_type().map(|t| t.is_symlink()).unwrap_or(false) && path.is_dir() {
                tracing::debug!(path = %path.display(), "not following directory symlink");
                continue;
            }

            let child = match FilesystemObject::from_path_cached(&path, cache) {
                Ok(child) => child,
                Err(e) if e.is_permission_denied() => {
                    tracing::info!(path = %path.display(), error = %e, "skipping file");
                    continue;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "couldn't create new object");
                    return Err(e);
                }
            };

            if child.is_dir {
                child.scan(cache).map_err(|e| {
                    tracing::error!(path = %child.path.display(), error = %e, "couldn't scan child");
                    e
                })?;
            }
            children.push(child);
        }
        Ok(())
    }

    /// Remove every directory below this node that ends up holding no files.
    ///
    /// A root node is rescanned first and is never deleted itself. A non-root
    /// node that keeps children reports `FsError::DirectoryNotEmpty`, which the
    /// parent takes as "keep this one".
    pub fn clean(&self, cache: &ContentCache) -> FsResult<()> {
        if !self.is_dir {
            return Err(FsError::NotDirectory(self.path.clone()));
        }
        if self.root {
            tracing::info!(path = %self.path.display(), "cleaning up empty directories");
            self.scan(cache).map_err(|e| {
                tracing::error!(path = %self.path.display(), error = %e, "couldn't scan for cleanup");
                e
            })?;
        } else {
            tracing::debug!(path = %self.path.display(), "cleaning up empty directories");
        }

        let mut children = self.children.lock();

        let mut kept = Vec::with_capacity(children.len());
        for child in children.iter() {
            if !child.is_dir {
                kept.push(Arc::clone(child));
                continue;
            }
            match child.clean(cache) {
                Ok(()) => {}
                Err(FsError::DirectoryNotEmpty(_)) => kept.push(Arc::clone(child)),
                Err(e) => {
                    tracing::error!(path = %child.path.display(), error = %e, "can't clean up child");
                    return Err(e);
                }
            }
        }
        *children = kept;

        if self.root {
            return Ok(());
        }
        if !children.is_empty() {
            return Err(FsError::DirectoryNotEmpty(self.path.clone()));
        }

        tracing::info!(path = %self.path.display(), "deleting empty directory");
        match fs::remove_dir(&self.path) {
            Ok(()) => Ok(()),
            // Entries the scan skipped, or ones created since, still count.
            Err(_) if has_entries(&self.path) => {
                tracing::debug!(path = %self.path.display(), "directory gained entries, keeping it");
                Err(FsError::DirectoryNotEmpty(self.path.clone()))
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed deleting directory");
                Err(FsError::io("delete", &self.path, e))
            }
        }
    }

    /// Every listable file below this node: regular, not a dotfile, not a `~` backup.
    pub fn all_files(&self) -> Vec<Arc<FilesystemObject>> {
        let mut out = Vec::new();
        self.collect_files(&mut out, &|f| f.is_listable());
        out
    }

    /// Every regular file below this node, hidden ones included.
    pub fn regular_files(&self) -> Vec<Arc<FilesystemObject>> {
        let mut out = Vec::new();
        self.collect_files(&mut out, &|f| f.is_regular());
        out
    }

    pub fn is_listable(&self) -> bool {
        if !self.is_regular() {
            return false;
        }
        let hidden = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(false);
        !hidden && !self.path.to_string_lossy().ends_with('~')
    }

    fn collect_files(
        &self,
        out: &mut Vec<Arc<FilesystemObject>>,
        keep: &dyn Fn(&FilesystemObject) -> bool,
    ) {
        for child in self.children() {
            if child.is_dir {
                child.collect_files(out, keep);
            } else if keep(&child) {
                out.push(child);
            }
        }
    }
}

fn has_entries(path: &Path) -> bool {
    fs::read_dir(path).map(|mut it| it.next().is_some()).unwrap_or(false)
}

fn stat(path: &Path) -> FsResult<Metadata> {
    fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "couldn't stat");
        } else {
            tracing::error!(path = %path.display(), error = %e, "couldn't stat");
        }
        FsError::io("stat", path, e)
    })
}

#[cfg(unix)]
fn raw_mode(info: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    info.mode()
}

// No raw mode bits off unix; synthesize the file type part.
#[cfg(not(unix))]
fn raw_mode(info: &Metadata) -> u32 {
    if info.is_dir() {
        0o040000
    } else if info.is_file() {
        0o100000
    } else {
        0
    }
}

#[cfg(unix)]
fn is_regular_mode(mode: u32) -> bool {
    mode & S_IFMT == S_IFREG
}

#[cfg(not(unix))]
fn is_regular_mode(mode: u32) -> bool {
    mode & 0o170000 == 0o100000
}
