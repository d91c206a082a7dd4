use std::sync::Arc;

use crate::config::AppConfig;
use crate::listing::ListingSource;
use crate::metrics::Metrics;
use crate::scanner::ContentCache;

/// The shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Checksum cache, also used by the download handlers.
    pub cache: Arc<ContentCache>,
    /// Backing strategy for `/fileinfo`, chosen from `listing.source`.
    pub listing: Arc<dyn ListingSource>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        cache: Arc<ContentCache>,
        listing: Arc<dyn ListingSource>,
        metrics: Metrics,
    ) -> Self {
        Self { config: Arc::new(config), cache, listing, metrics }
    }
}
