//! Cached product collection.
//!
//! The filter panel derives its options and price bounds from the whole
//! collection, so every listing request needs it. The collection is cached
//! with `moka` for the configured TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use jocestech_core::Product;

use super::{ApiClient, BackendError};

/// Cache key for catalog entries.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CatalogKey {
    AllProducts,
}

/// Product collection backed by the API client.
#[derive(Clone)]
pub struct Catalog {
    client: ApiClient,
    cache: Cache<CatalogKey, Arc<[Product]>>,
}

impl Catalog {
    /// Create a catalog whose cached collection expires after `ttl`.
    #[must_use]
    pub fn new(client: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { client, cache }
    }

    /// The full product collection, fetched on a cache miss.
    ///
    /// Failures are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not cached and the backend
    /// request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<[Product]>, BackendError> {
        if let Some(products) = self.cache.get(&CatalogKey::AllProducts).await {
            debug!("Cache hit for product collection");
            return Ok(products);
        }

        let products: Arc<[Product]> = self.client.get_products().await?.into();
        self.cache
            .insert(CatalogKey::AllProducts, Arc::clone(&products))
            .await;
        Ok(products)
    }
}
