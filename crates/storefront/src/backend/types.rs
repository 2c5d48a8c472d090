//! Response envelopes returned by the backend.
//!
//! These wrap the domain types from `jocestech_core`; only the client
//! unwraps them.

use serde::Deserialize;

use jocestech_core::{Product, Review, ReviewPage};

/// `GET products`
#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// `GET products/{id}`
#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
}

/// `GET products/{id}/reviews?page={page}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsResponse {
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Total reviews for the product.
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub num_of_pages: Option<u32>,
}

impl ReviewsResponse {
    /// Attach the requested page number.
    ///
    /// Missing totals fall back to what the page itself shows.
    #[must_use]
    pub fn into_page(self, page: u32) -> ReviewPage {
        let shown = u32::try_from(self.reviews.len()).unwrap_or(u32::MAX);
        let total = self.count.unwrap_or(shown);
        ReviewPage {
            page,
            reviews: self.reviews,
            total,
            page_count: self.num_of_pages.unwrap_or(page).max(1),
        }
    }
}
