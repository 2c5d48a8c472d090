//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to product listing
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (catalog reachable)
//!
//! # Products
//! GET  /products               - Product listing (filter panel + grid; fragment for HTMX)
//! POST /products/filters       - Filter interaction (returns listing fragment)
//! POST /products/filters/clear - Reset filters (returns listing fragment)
//!
//! # Product detail
//! GET  /products/{id}                     - Product detail page (detail fragment for HTMX)
//!                                           ?poll=true renders current state without refetching
//! GET  /products/{id}/reviews             - Review section fragment (?page=n)
//! POST /products/{id}/reviews/submitted   - New review signal (returns detail fragment)
//! ```

pub mod product_detail;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    response::Redirect,
    routing::{get, post},
};

use crate::middleware::filter_rate_limiter;
use crate::state::AppState;

/// Header HTMX sets on every request it issues.
const HX_REQUEST: &str = "hx-request";

/// Whether the request was issued by HTMX and expects a fragment.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Create the filter interaction router.
///
/// Rate limited per client IP.
pub fn filter_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::update_filters))
        .route("/clear", post(products::clear_filters))
        .layer(filter_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .nest("/filters", filter_routes())
        .route("/{id}", get(product_detail::show))
        .route("/{id}/reviews", get(product_detail::reviews))
        .route(
            "/{id}/reviews/submitted",
            post(product_detail::review_submitted),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .nest("/products", product_routes())
}
