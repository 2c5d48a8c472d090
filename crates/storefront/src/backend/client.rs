//! Preconfigured HTTP client for the backend REST API.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use jocestech_core::{Product, ProductId, ReviewPage};

use super::BackendError;
use super::types::{ProductResponse, ProductsResponse, ReviewsResponse};
use crate::config::BackendConfig;

/// Maximum number of body characters kept in error messages and logs.
const ERROR_BODY_PREVIEW: usize = 200;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the backend REST API.
///
/// Every request path is resolved against the configured base address, so
/// the address is defined in exactly one place. No retries, no caching.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    /// Always ends with `/` so relative paths append instead of replacing
    /// the last segment.
    base_url: Url,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// The base address all paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve a path relative to the base address.
    ///
    /// A leading `/` is ignored. Absolute URLs and paths that escape the base
    /// address are rejected.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPath` if the path does not resolve
    /// beneath the base address.
    pub fn url(&self, path: &str) -> Result<Url, BackendError> {
        let relative = path.trim_start_matches('/');
        if Url::parse(relative).is_ok() {
            return Err(BackendError::InvalidPath(path.to_string()));
        }

        let url = self
            .inner
            .base_url
            .join(relative)
            .map_err(|_| BackendError::InvalidPath(path.to_string()))?;

        if !url.as_str().starts_with(self.inner.base_url.as_str()) {
            return Err(BackendError::InvalidPath(path.to_string()));
        }
        Ok(url)
    }

    // =========================================================================
    // Verb Methods
    // =========================================================================

    /// Start a request with an arbitrary method.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPath` if `path` is not a relative path.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        let url = self.url(path)?;
        Ok(self.inner.client.request(method, url))
    }

    /// Start a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPath` if `path` is not a relative path.
    pub fn get(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        self.request(Method::GET, path)
    }

    /// Start a `POST` request.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPath` if `path` is not a relative path.
    pub fn post(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        self.request(Method::POST, path)
    }

    /// Start a `PUT` request.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPath` if `path` is not a relative path.
    pub fn put(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        self.request(Method::PUT, path)
    }

    /// Start a `PATCH` request.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPath` if `path` is not a relative path.
    pub fn patch(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        self.request(Method::PATCH, path)
    }

    /// Start a `DELETE` request.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidPath` if `path` is not a relative path.
    pub fn delete(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        self.request(Method::DELETE, path)
    }

    /// Send a request and decode its JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a body
    /// that does not decode as `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BackendError> {
        let request = request.build()?;
        let path = request.url().path().to_string();

        let response = self.inner.client.execute(request).await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(path));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = preview(&body);
            tracing::error!(
                status = %status,
                path = %path,
                body = %message,
                "Backend returned non-success status"
            );
            return Err(BackendError::Status { status, message });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %preview(&body),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// `GET` a path and decode its JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send_json`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let request = self.get(path)?;
        self.send_json(request).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the full product collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, BackendError> {
        let response: ProductsResponse = self.get_json("products").await?;
        debug!(count = response.products.len(), "Fetched product collection");
        Ok(response.products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, BackendError> {
        let path = format!("products/{}", urlencoding::encode(id.as_str()));
        let response: ProductResponse = self.get_json(&path).await?;
        Ok(response.product)
    }

    /// Get one page of reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product_reviews(
        &self,
        id: &ProductId,
        page: u32,
    ) -> Result<ReviewPage, BackendError> {
        let page = page.max(1);
        let mut url = self.url(&format!(
            "products/{}/reviews",
            urlencoding::encode(id.as_str())
        ))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let response: ReviewsResponse = self.send_json(self.inner.client.get(url)).await?;
        debug!(page, count = response.reviews.len(), "Fetched review page");
        Ok(response.into_page(page))
    }
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode,
        routing::get,
    };
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::config::parse_api_url;
    use crate::test_support::spawn_backend;

    fn client_for(base: &str) -> ApiClient {
        ApiClient::new(&BackendConfig {
            api_url: parse_api_url(base).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_url_resolves_relative_paths() {
        let client = client_for("https://backend.example.com/api/v1");
        assert_eq!(
            client.url("products").unwrap().as_str(),
            "https://backend.example.com/api/v1/products"
        );
        assert_eq!(
            client.url("/products/p1/reviews?page=2").unwrap().as_str(),
            "https://backend.example.com/api/v1/products/p1/reviews?page=2"
        );
    }

    #[test]
    fn test_url_keeps_trailing_slash_base() {
        let client = client_for("https://backend.example.com/api/v1/");
        assert_eq!(client.base_url().as_str(), "https://backend.example.com/api/v1/");
        assert_eq!(
            client.url("products").unwrap().as_str(),
            "https://backend.example.com/api/v1/products"
        );
    }

    #[test]
    fn test_url_rejects_absolute_and_escaping_paths() {
        let client = client_for("https://backend.example.com/api/v1");
        assert!(matches!(
            client.url("https://evil.example.com/products"),
            Err(BackendError::InvalidPath(_))
        ));
        assert!(matches!(
            client.url("../admin"),
            Err(BackendError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_verb_methods_target_base_address() {
        let client = client_for("https://backend.example.com/api/v1");
        let request = client.post("reviews").unwrap().build().unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://backend.example.com/api/v1/reviews"
        );

        let request = client.delete("/reviews/r1").unwrap().build().unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.url().path(), "/api/v1/reviews/r1");
    }

    #[derive(Deserialize)]
    struct PageQuery {
        page: u32,
    }

    fn backend() -> Router {
        Router::new()
            .route(
                "/api/v1/products",
                get(|| async {
                    Json(json!({
                        "products": [
                            {"_id": "p1", "name": "Phone", "price": 59900, "category": "Phones"},
                            {"_id": "p2", "name": "Laptop", "price": 129900, "category": "Laptops"}
                        ]
                    }))
                }),
            )
            .route(
                "/api/v1/products/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        return Err(StatusCode::NOT_FOUND);
                    }
                    if id == "broken" {
                        return Ok(Json(json!({"unexpected": true})));
                    }
                    Ok(Json(json!({"product": {"_id": id, "name": "Phone", "price": 59900}})))
                }),
            )
            .route(
                "/api/v1/products/{id}/reviews",
                get(
                    |Path(id): Path<String>, Query(query): Query<PageQuery>| async move {
                        if id == "flaky" {
                            return Err((StatusCode::INTERNAL_SERVER_ERROR, "database offline"));
                        }
                        Ok(Json(json!({
                            "reviews": [{"_id": format!("r{}", query.page), "rating": 4, "product": id}],
                            "count": 3,
                            "numOfPages": 3
                        })))
                    },
                ),
            )
    }

    #[tokio::test]
    async fn test_get_products() {
        let base = spawn_backend(backend()).await;
        let products = client_for(&base).get_products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].name, "Laptop");
    }

    #[tokio::test]
    async fn test_get_product() {
        let base = spawn_backend(backend()).await;
        let product = client_for(&base)
            .get_product(&ProductId::new("p1"))
            .await
            .unwrap();
        assert_eq!(product.id.as_str(), "p1");
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let base = spawn_backend(backend()).await;
        let err = client_for(&base)
            .get_product(&ProductId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(path) if path.ends_with("/products/missing")));
    }

    #[tokio::test]
    async fn test_get_product_unexpected_body() {
        let base = spawn_backend(backend()).await;
        let err = client_for(&base)
            .get_product(&ProductId::new("broken"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[tokio::test]
    async fn test_get_product_reviews_passes_page() {
        let base = spawn_backend(backend()).await;
        let page = client_for(&base)
            .get_product_reviews(&ProductId::new("p1"), 2)
            .await
            .unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.reviews[0].id.as_str(), "r2");
        assert_eq!(page.page_count, 3);
    }

    #[tokio::test]
    async fn test_get_product_reviews_server_error() {
        let base = spawn_backend(backend()).await;
        let err = client_for(&base)
            .get_product_reviews(&ProductId::new("flaky"), 1)
            .await
            .unwrap_err();
        match err {
            BackendError::Status { status, message } => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "database offline");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        // Nothing listens on port 9 (discard) locally.
        let err = client_for("http://127.0.0.1:9/api/v1")
            .get_products()
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Http(_)));
    }
}
