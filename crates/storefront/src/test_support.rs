//! Shared fixtures for tests: a throwaway backend and request helpers.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query},
    http::{Request, Response, StatusCode, header},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::{BackendConfig, SentryConfig, StorefrontConfig, parse_api_url};
use crate::state::AppState;

/// Serve `app` on an ephemeral local port and return its `/api/v1` base URL.
pub async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v1")
}

/// Storefront configuration pointing at `api_url`.
pub fn test_config(api_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        backend: BackendConfig {
            api_url: parse_api_url(api_url).unwrap(),
            timeout: Duration::from_secs(5),
        },
        catalog_cache_ttl: Duration::from_secs(60),
        sentry: SentryConfig::default(),
    }
}

/// Full storefront router backed by the fake catalog backend.
pub async fn test_app() -> Router {
    let base = spawn_backend(catalog_backend()).await;
    crate::app(AppState::new(test_config(&base)).unwrap())
}

/// Storefront router whose backend is unreachable.
pub fn offline_app() -> Router {
    // Nothing listens on the discard port locally.
    crate::app(AppState::new(test_config("http://127.0.0.1:9/api/v1")).unwrap())
}

// =============================================================================
// Fake Backend
// =============================================================================

/// Three products: two categories spelled inconsistently, one out of stock.
pub fn catalog() -> Value {
    json!([
        {
            "_id": "p1",
            "name": "iPhone 15",
            "price": 79900,
            "description": "The latest phone.",
            "inventory": 5,
            "category": "Phones",
            "company": "Apple",
            "colors": ["#000000", "#ffb900"],
            "freeShipping": true,
            "features": "A16 chip",
            "box": ["1x iPhone 15", "1x USB-C cable"],
            "image": ["https://img.example.com/iphone.jpg"],
            "averageRating": 4.4,
            "groupRating": [{"_id": 5, "count": 7}, {"_id": 4, "count": 3}],
            "numOfReviews": 10
        },
        {
            "_id": "p2",
            "name": "MacBook Air",
            "price": 119900,
            "inventory": 0,
            "category": "Laptops",
            "company": "Apple",
            "colors": ["#c0c0c0"],
            "freeShipping": false,
            "image": "https://img.example.com/macbook.jpg"
        },
        {
            "_id": "p3",
            "name": "ThinkPad X1",
            "price": 149900,
            "inventory": 2,
            "category": "laptops",
            "company": "Lenovo",
            "colors": ["#000000"],
            "freeShipping": true
        }
    ])
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

/// Backend serving [`catalog`]. Reviews for `p2` always fail.
pub fn catalog_backend() -> Router {
    Router::new()
        .route(
            "/api/v1/products",
            get(|| async { Json(json!({ "products": catalog() })) }),
        )
        .route(
            "/api/v1/products/{id}",
            get(|Path(id): Path<String>| async move {
                catalog()
                    .as_array()
                    .and_then(|products| products.iter().find(|p| p["_id"] == id.as_str()))
                    .map(|product| Json(json!({ "product": product })))
                    .ok_or(StatusCode::NOT_FOUND)
            }),
        )
        .route(
            "/api/v1/products/{id}/reviews",
            get(
                |Path(id): Path<String>, Query(query): Query<PageQuery>| async move {
                    if id == "p2" {
                        return Err(StatusCode::INTERNAL_SERVER_ERROR);
                    }
                    let page = query.page.unwrap_or(1);
                    Ok(Json(json!({
                        "reviews": [{
                            "_id": format!("{id}-r{page}"),
                            "rating": 5,
                            "title": format!("Review on page {page}"),
                            "comment": "Works great",
                            "user": {"_id": "u1", "name": "Ada"},
                            "product": id
                        }],
                        "count": 12,
                        "numOfPages": 2
                    })))
                },
            ),
        )
}

// =============================================================================
// Request Helpers
// =============================================================================

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().uri(uri), cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn htmx_get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::builder().uri(uri).header("hx-request", "true"), cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("hx-request", "true")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
        cookie,
    )
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn with_cookie(
    builder: axum::http::request::Builder,
    cookie: Option<&str>,
) -> axum::http::request::Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

/// The `name=value` pair of the session cookie set by `response`.
pub fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(crate::middleware::session::SESSION_COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
