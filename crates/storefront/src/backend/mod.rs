//! Backend REST API access.
//!
//! # Architecture
//!
//! - [`ApiClient`] is the single request-issuing object. It owns the base
//!   address; every call site passes a path relative to it.
//! - The backend is the source of truth for products and reviews. The only
//!   caching is the product collection held by [`Catalog`] for the filter
//!   panel (5 minute TTL by default).
//!
//! # Example
//!
//! ```rust,ignore
//! use jocestech_storefront::backend::ApiClient;
//!
//! let client = ApiClient::new(&config.backend)?;
//!
//! let product = client.get_product(&ProductId::new("64f1")).await?;
//! let reviews = client.get_product_reviews(&product.id, 2).await?;
//! ```

mod catalog;
mod client;
pub mod types;

pub use catalog::Catalog;
pub use client::ApiClient;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The request path does not resolve beneath the base address.
    #[error("Invalid request path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::NotFound("products/p1".to_string());
        assert_eq!(err.to_string(), "Not found: products/p1");

        let err = BackendError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            message: "upstream down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend returned 502 Bad Gateway: upstream down"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = BackendError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
