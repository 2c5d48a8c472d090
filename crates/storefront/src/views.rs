//! Per-visitor product detail view state and fetch execution.
//!
//! Each product a visitor has open gets its own [`ProductDetailView`] behind
//! an async mutex, so tabs showing different products never supersede each
//! other. A handler locks a view only to plan or to apply results; the
//! backend calls in between run unlocked, so a newer request for the same
//! view can start while an older one is still waiting. Generation tokens make
//! the older response a no-op when it finally lands.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use jocestech_core::ProductId;
use jocestech_core::detail::{FetchPlan, ProductDetailView};

use crate::backend::ApiClient;

/// Detail views are dropped after this long without a request.
const VIEW_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Upper bound on concurrently tracked views.
const MAX_VIEWS: u64 = 50_000;

/// Shared handle to one detail view.
pub type SharedDetailView = Arc<Mutex<ProductDetailView>>;

/// Registry of detail views keyed by visitor and product.
#[derive(Clone)]
pub struct DetailViews {
    views: Cache<(Uuid, ProductId), SharedDetailView>,
}

impl Default for DetailViews {
    fn default() -> Self {
        Self::new(VIEW_IDLE_TIMEOUT)
    }
}

impl DetailViews {
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        let views = Cache::builder()
            .max_capacity(MAX_VIEWS)
            .time_to_idle(idle_timeout)
            .build();
        Self { views }
    }

    /// The visitor's view of `product`, created on first use.
    #[must_use]
    pub fn for_product(&self, visitor: Uuid, product: &ProductId) -> SharedDetailView {
        self.views.get_with((visitor, product.clone()), || {
            Arc::new(Mutex::new(ProductDetailView::new()))
        })
    }
}

/// Run the fetches in `plan` concurrently and apply their results to `view`.
///
/// Failures are stored as the section's error state. Results superseded by a
/// newer request are discarded.
#[instrument(skip_all, fields(
    product = plan.product.is_some(),
    reviews = plan.reviews.is_some(),
))]
pub async fn execute_plan(api: &ApiClient, view: &Mutex<ProductDetailView>, plan: FetchPlan) {
    if plan.is_empty() {
        return;
    }

    let product_fetch = async {
        match &plan.product {
            Some(request) => Some(api.get_product(&request.id).await),
            None => None,
        }
    };
    let reviews_fetch = async {
        match &plan.reviews {
            Some(request) => Some(api.get_product_reviews(&request.id, request.page).await),
            None => None,
        }
    };
    let (product, reviews) = tokio::join!(product_fetch, reviews_fetch);

    let mut view = view.lock().await;

    if let (Some(request), Some(result)) = (plan.product, product) {
        if let Err(e) = &result {
            warn!(id = %request.id, error = %e, "Product fetch failed");
        }
        if !view.complete_product(request.token, result) {
            debug!(id = %request.id, "Discarded stale product response");
        }
    }

    if let (Some(request), Some(result)) = (plan.reviews, reviews) {
        if let Err(e) = &result {
            warn!(id = %request.id, page = request.page, error = %e, "Review fetch failed");
        }
        if !view.complete_reviews(request.token, result) {
            debug!(id = %request.id, page = request.page, "Discarded stale review response");
        }
    }
}
