//! Fetch orchestration for the product detail view.
//!
//! The detail view shows two independently fetched resources: the product
//! record and one page of its reviews. [`ProductDetailView`] decides which
//! fetches a navigation or signal triggers and returns them as a
//! [`FetchPlan`]; the caller performs the requests and hands each result back
//! with the [`RequestToken`] it was issued.
//!
//! Every trigger bumps the resource's generation. A result is applied only if
//! its token belongs to the latest generation, so a slow response for an
//! earlier product or page can never overwrite a newer one.

use std::fmt::Display;

use crate::types::{Product, ProductId, ReviewPage};

/// Load status of one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus<T> {
    /// Nothing requested yet.
    Idle,
    Loading,
    /// The latest request failed with this message.
    Failed(String),
    Loaded(T),
}

impl<T> Default for FetchStatus<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> FetchStatus<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifies one issued request for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// A resource's status plus the generation of its latest request.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    generation: u64,
    status: FetchStatus<T>,
}

impl<T> Default for Tracked<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            status: FetchStatus::Idle,
        }
    }
}

impl<T> Tracked<T> {
    /// Start a new request, superseding any in flight.
    fn begin(&mut self) -> RequestToken {
        self.generation += 1;
        self.status = FetchStatus::Loading;
        RequestToken(self.generation)
    }

    /// Apply a result if `token` is still the latest request.
    fn settle<E: Display>(&mut self, token: RequestToken, result: Result<T, E>) -> bool {
        if token.0 != self.generation || !self.status.is_loading() {
            return false;
        }
        self.status = match result {
            Ok(data) => FetchStatus::Loaded(data),
            Err(e) => FetchStatus::Failed(e.to_string()),
        };
        true
    }

    #[must_use]
    pub const fn status(&self) -> &FetchStatus<T> {
        &self.status
    }
}

/// Request for the product record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRequest {
    pub id: ProductId,
    pub token: RequestToken,
}

/// Request for one page of reviews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewsRequest {
    pub id: ProductId,
    pub page: u32,
    pub token: RequestToken,
}

/// Fetches triggered by one navigation or signal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchPlan {
    pub product: Option<ProductRequest>,
    pub reviews: Option<ReviewsRequest>,
    /// The view should reset its scroll position.
    pub scroll_to_top: bool,
}

impl FetchPlan {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.product.is_none() && self.reviews.is_none()
    }
}

/// State of the product detail view for one visitor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductDetailView {
    product_id: Option<ProductId>,
    page: u32,
    review_signal: u64,
    product: Tracked<Product>,
    reviews: Tracked<ReviewPage>,
}

impl ProductDetailView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn product_id(&self) -> Option<&ProductId> {
        self.product_id.as_ref()
    }

    /// Current 1-based review page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        if self.page == 0 { 1 } else { self.page }
    }

    /// Number of "new review submitted" signals seen.
    #[must_use]
    pub const fn review_signal(&self) -> u64 {
        self.review_signal
    }

    #[must_use]
    pub const fn product(&self) -> &FetchStatus<Product> {
        self.product.status()
    }

    #[must_use]
    pub const fn reviews(&self) -> &FetchStatus<ReviewPage> {
        self.reviews.status()
    }

    /// Navigate to `id`. Triggers nothing if it is already the current product.
    pub fn navigate(&mut self, id: ProductId) -> FetchPlan {
        if self.product_id.as_ref() == Some(&id) {
            return FetchPlan::default();
        }
        self.load(id)
    }

    /// Load `id` unconditionally, re-fetching both resources.
    ///
    /// Switching to a different product starts its reviews at page 1.
    pub fn load(&mut self, id: ProductId) -> FetchPlan {
        if self.product_id.as_ref() != Some(&id) {
            self.page = 1;
        }
        self.product_id = Some(id);
        FetchPlan {
            product: self.begin_product(),
            reviews: self.begin_reviews(),
            scroll_to_top: true,
        }
    }

    /// Show another page of reviews for the current product.
    ///
    /// Triggers nothing if the page is unchanged or no product is loaded.
    pub fn set_page(&mut self, page: u32) -> FetchPlan {
        let page = page.max(1);
        if page == self.page() {
            return FetchPlan::default();
        }
        self.page = page;
        FetchPlan {
            reviews: self.begin_reviews(),
            ..FetchPlan::default()
        }
    }

    /// Show `page` of reviews for `id`, re-fetching the page even if unchanged.
    ///
    /// A different `id` loads that product first.
    pub fn show_reviews(&mut self, id: ProductId, page: u32) -> FetchPlan {
        if self.product_id.as_ref() != Some(&id) {
            let mut plan = self.load(id);
            self.page = page.max(1);
            plan.reviews = self.begin_reviews();
            return plan;
        }
        self.page = page.max(1);
        FetchPlan {
            reviews: self.begin_reviews(),
            ..FetchPlan::default()
        }
    }

    /// A review was submitted for the current product.
    ///
    /// Re-fetches the product (its rating summary changed) and the current
    /// review page. The page number is kept.
    pub fn review_submitted(&mut self) -> FetchPlan {
        self.review_signal += 1;
        FetchPlan {
            product: self.begin_product(),
            reviews: self.begin_reviews(),
            scroll_to_top: false,
        }
    }

    /// Apply a product result. Returns `false` if the result was stale.
    pub fn complete_product<E: Display>(
        &mut self,
        token: RequestToken,
        result: Result<Product, E>,
    ) -> bool {
        self.product.settle(token, result)
    }

    /// Apply a review page result. Returns `false` if the result was stale.
    pub fn complete_reviews<E: Display>(
        &mut self,
        token: RequestToken,
        result: Result<ReviewPage, E>,
    ) -> bool {
        self.reviews.settle(token, result)
    }

    fn begin_product(&mut self) -> Option<ProductRequest> {
        let id = self.product_id.clone()?;
        Some(ProductRequest {
            id,
            token: self.product.begin(),
        })
    }

    fn begin_reviews(&mut self) -> Option<ReviewsRequest> {
        let id = self.product_id.clone()?;
        Some(ReviewsRequest {
            id,
            page: self.page(),
            token: self.reviews.begin(),
        })
    }
}
