//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{ApiClient, BackendError, Catalog};
use crate::config::StorefrontConfig;
use crate::selections::FilterSelections;
use crate::views::DetailViews;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client, the cached catalog and per-visitor view and filter state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    catalog: Catalog,
    detail_views: DetailViews,
    filter_selections: FilterSelections,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, BackendError> {
        let api = ApiClient::new(&config.backend)?;
        let catalog = Catalog::new(api.clone(), config.catalog_cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                catalog,
                detail_views: DetailViews::default(),
                filter_selections: FilterSelections::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the cached product collection.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the per-visitor product detail views.
    #[must_use]
    pub fn detail_views(&self) -> &DetailViews {
        &self.inner.detail_views
    }

    /// Get a reference to the per-visitor filter selections.
    #[must_use]
    pub fn filter_selections(&self) -> &FilterSelections {
        &self.inner.filter_selections
    }
}
