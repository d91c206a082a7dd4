//! Where `/fileinfo` gets its file set from.
//!
//! Two strategies are selected at startup: [`CacheListing`] returns what the
//! monitors last pushed into the content cache, [`RegistryListing`] cleans and
//! rescans every registered root per request.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use crate::scanner::{ContentCache, FilesystemObject, Registry, WebObject};

/// The file set returned by a listing source, serialized as a flat JSON array.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Cached(Vec<Arc<FilesystemObject>>),
    Web(Vec<WebObject>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Listing::Cached(v) => v.len(),
            Listing::Web(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait ListingSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn list(&self) -> anyhow::Result<Listing>;
}

pub struct CacheListing {
    cache: Arc<ContentCache>,
}

impl CacheListing {
    pub fn new(cache: Arc<ContentCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ListingSource for CacheListing {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn list(&self) -> anyhow::Result<Listing> {
        let mut files: Vec<_> =
            self.cache.all_values().into_iter().filter(|f| f.is_listable()).collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Listing::Cached(files))
    }
}

pub struct RegistryListing {
    registry: Arc<Registry>,
}

impl RegistryListing {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ListingSource for RegistryListing {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn list(&self) -> anyhow::Result<Listing> {
        let registry = self.registry.clone();
        let files = tokio::task::spawn_blocking(move || registry.list_all_files())
            .await
            .context("listing task failed")?
            .context("couldn't scan files")?;
        Ok(Listing::Web(files))
    }
}
