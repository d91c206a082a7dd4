use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::cache::ContentCache;
use super::object::FilesystemObject;
use crate::error::FsResult;

/// A file node together with the URL it can be downloaded from.
#[derive(Debug, Clone, Serialize)]
pub struct WebObject {
    #[serde(flatten)]
    pub object: Arc<FilesystemObject>,
    pub web_path: String,
}

impl WebObject {
    /// Every occurrence of `disk_root` in the node's path is replaced by the
    /// web prefix without its trailing slash.
    ///
    /// Child paths never carry the root's trailing slash, so it is trimmed
    /// before matching.
    pub fn new(web_prefix: &str, disk_root: &Path, object: Arc<FilesystemObject>) -> Self {
        let prefix = web_prefix.trim_end_matches('/');
        let disk_path = object.path.to_string_lossy();
        let root = disk_root.to_string_lossy();
        let root = root.trim_end_matches('/');
        let web_path = if root.is_empty() {
            // Serving the filesystem root: every absolute path sits below it.
            format!("{}{}", prefix, disk_path)
        } else {
            disk_path.replace(root, prefix)
        };
        Self { object, web_path }
    }
}

/// Append the trailing slash every serve prefix is keyed by.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// Keeps track of which disk roots are served under which URL prefix.
pub struct Registry {
    roots: RwLock<BTreeMap<String, Arc<FilesystemObject>>>,
    cache: Arc<ContentCache>,
}

impl Registry {
    pub fn new(cache: Arc<ContentCache>) -> Self {
        Self { roots: RwLock::new(BTreeMap::new()), cache }
    }

    /// Register a disk root under a URL prefix, replacing any earlier root there.
    pub fn register(&self, web_prefix: &str, disk_path: impl AsRef<Path>) -> FsResult<()> {
        let web_prefix = normalize_prefix(web_prefix);
        let root = FilesystemObject::from_path(disk_path.as_ref(), true)?;
        tracing::info!(disk_path = %root.path.display(), serve_path = %web_prefix, "registering root");
        self.roots.write().insert(web_prefix, root);
        Ok(())
    }

    /// Registered `(prefix, disk root)` pairs, ordered by prefix.
    pub fn roots(&self) -> Vec<(String, Arc<FilesystemObject>)> {
        self.roots.read().iter().map(|(p, r)| (p.clone(), r.clone())).collect()
    }

    /// Clean every registered root and list its files under their web paths.
    ///
    /// Blocks on disk I/O. Any clean failure aborts the whole listing.
    pub fn list_all_files(&self) -> FsResult<Vec<WebObject>> {
        let mut files = Vec::new();
        for (prefix, root) in self.roots() {
            root.clean(&self.cache)?;
            self.cache.sync_tree(&root);
            files.extend(
                root.all_files().into_iter().map(|f| WebObject::new(&prefix, &root.path, f)),
            );
        }
        Ok(files)
    }
}
