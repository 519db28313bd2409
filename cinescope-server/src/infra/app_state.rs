use std::{fmt, sync::Arc};

use cinescope_core::CatalogService;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("cache_backend", &self.catalog.cache_backend())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(catalog: Arc<CatalogService>, config: Arc<Config>) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
