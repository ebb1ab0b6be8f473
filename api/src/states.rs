use crate::{
    cache::{INDEX_KEY_PREFIX, PageCache},
    config::Config,
    store::Store,
};
use std::sync::Arc;

/// Shared across all requests; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub page_cache: PageCache,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: Arc::new(Store::new()),
            page_cache: PageCache::new(INDEX_KEY_PREFIX, config.index_cache_ttl),
            config: Arc::new(config),
        }
    }
}
