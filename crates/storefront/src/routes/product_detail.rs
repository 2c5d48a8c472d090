//! Product detail and review section handlers.
//!
//! Product and review page are fetched independently and rendered as two
//! sections, each with its own loading and error state. A section that is
//! still loading when rendered (a newer request from the same visitor took
//! over) polls the detail fragment until it settles.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use jocestech_core::detail::{FetchStatus, ProductDetailView};
use jocestech_core::{Product, ProductId, Review, ReviewPage};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::Visitor;
use crate::routes::is_htmx;
use crate::state::AppState;
use crate::views::execute_plan;

/// Response header asking HTMX to fire a client-side event.
const HX_TRIGGER: &str = "hx-trigger";

/// Client-side event that scrolls the page to the top.
const SCROLL_TO_TOP_EVENT: &str = "scrollToTop";

// =============================================================================
// View Models
// =============================================================================

/// One independently fetched section.
#[derive(Clone)]
pub struct SectionView<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> SectionView<T> {
    fn loading() -> Self {
        Self {
            loading: true,
            error: None,
            data: None,
        }
    }

    fn from_status<U>(status: &FetchStatus<U>, render: impl FnOnce(&U) -> T) -> Self {
        match status {
            FetchStatus::Idle | FetchStatus::Loading => Self::loading(),
            FetchStatus::Failed(message) => Self {
                loading: false,
                error: Some(message.clone()),
                data: None,
            },
            FetchStatus::Loaded(data) => Self {
                loading: false,
                error: None,
                data: Some(render(data)),
            },
        }
    }
}

/// Box-contents line split into quantity code and description.
#[derive(Clone)]
pub struct BoxItemView {
    pub code: String,
    pub description: String,
}

/// Number of reviews at one star rating.
#[derive(Clone)]
pub struct RatingGroupView {
    pub rating: u8,
    pub count: u32,
}

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductPageView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub company: String,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub features: String,
    pub box_items: Vec<BoxItemView>,
    pub in_stock: bool,
    pub stock_label: &'static str,
    pub free_shipping: bool,
    pub average_rating: f64,
    /// Average rating with one decimal, e.g. `4.4`.
    pub rating_label: String,
    pub num_of_reviews: u32,
    /// Counts for 5 down to 1 stars, zero-filled.
    pub rating_groups: Vec<RatingGroupView>,
}

impl From<&Product> for ProductPageView {
    fn from(product: &Product) -> Self {
        let rating_groups = (1..=5u8)
            .rev()
            .map(|rating| RatingGroupView {
                rating,
                count: product
                    .group_rating
                    .iter()
                    .filter(|group| group.rating == rating)
                    .map(|group| group.count)
                    .sum(),
            })
            .collect();

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            description: product.description.clone(),
            category: product.category.clone(),
            company: product.company.clone(),
            images: product.image.clone(),
            colors: product.colors.clone(),
            features: product.features.clone(),
            box_items: product
                .box_items()
                .map(|item| BoxItemView {
                    code: item.code.trim().to_string(),
                    description: item.description.trim().to_string(),
                })
                .collect(),
            in_stock: product.in_stock(),
            stock_label: if product.in_stock() {
                "In stock"
            } else {
                "out of stock"
            },
            free_shipping: product.free_shipping,
            average_rating: product.average_rating,
            rating_label: format!("{:.1}", product.average_rating),
            num_of_reviews: product.num_of_reviews,
            rating_groups,
        }
    }
}

/// Review display data for templates.
#[derive(Clone)]
pub struct ReviewView {
    pub author: String,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub date: Option<String>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            author: review.author_name().to_string(),
            rating: review.rating,
            title: review.title.clone(),
            comment: review.comment.clone(),
            date: review
                .created_at
                .map(|at| at.format("%B %-d, %Y").to_string()),
        }
    }
}

/// One page of reviews for templates.
#[derive(Clone)]
pub struct ReviewsView {
    pub page: u32,
    pub page_count: u32,
    pub total: u32,
    pub reviews: Vec<ReviewView>,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
}

impl From<&ReviewPage> for ReviewsView {
    fn from(page: &ReviewPage) -> Self {
        Self {
            page: page.page,
            page_count: page.page_count,
            total: page.total,
            reviews: page.reviews.iter().map(ReviewView::from).collect(),
            previous_page: page.has_previous().then(|| page.page - 1),
            next_page: page.has_next().then(|| page.page + 1),
        }
    }
}

/// Both sections of the detail view, captured under the view's lock.
struct DetailSections {
    product_id: String,
    product: SectionView<ProductPageView>,
    reviews: SectionView<ReviewsView>,
}

impl DetailSections {
    /// Render the current state of the view for `id`.
    fn capture(view: &ProductDetailView, id: &ProductId) -> Self {
        Self {
            product_id: id.to_string(),
            product: SectionView::from_status(view.product(), |p| ProductPageView::from(p)),
            reviews: SectionView::from_status(view.reviews(), |page| ReviewsView::from(page)),
        }
    }

    fn polling(&self) -> bool {
        self.product.loading || self.reviews.loading
    }

    fn into_fragment(self) -> ProductDetailTemplate {
        ProductDetailTemplate {
            polling: self.polling(),
            product_id: self.product_id,
            product: self.product,
            reviews: self.reviews,
            reviews_poll: false,
        }
    }

    fn into_page(self) -> ProductShowTemplate {
        let title = self
            .product
            .data
            .as_ref()
            .map_or_else(|| "Product".to_string(), |p| p.name.clone());
        ProductShowTemplate {
            title,
            polling: self.polling(),
            product_id: self.product_id,
            product: self.product,
            reviews: self.reviews,
            reviews_poll: false,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub title: String,
    pub product_id: String,
    pub product: SectionView<ProductPageView>,
    pub reviews: SectionView<ReviewsView>,
    pub polling: bool,
    pub reviews_poll: bool,
}

/// Detail fragment (product + reviews sections) for HTMX swaps.
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_detail.html")]
pub struct ProductDetailTemplate {
    pub product_id: String,
    pub product: SectionView<ProductPageView>,
    pub reviews: SectionView<ReviewsView>,
    pub polling: bool,
    pub reviews_poll: bool,
}

/// Review section fragment for HTMX swaps.
#[derive(Template, WebTemplate)]
#[template(path = "partials/reviews.html")]
pub struct ReviewsTemplate {
    pub product_id: String,
    pub reviews: SectionView<ReviewsView>,
    /// Poll on its own while loading (not embedded in a polling fragment).
    pub reviews_poll: bool,
}

/// Product page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    /// Set by the fragments that re-poll while a section is loading.
    #[serde(default)]
    pub poll: bool,
}

/// Review pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    pub page: Option<u32>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a product.
///
/// Page loads and HTMX navigation re-fetch both sections. Polls render the
/// current state and only fetch if the view was never loaded (or has been
/// evicted).
#[instrument(skip_all, fields(id = %id, poll = query.poll))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ShowQuery>,
    visitor: Visitor,
    headers: HeaderMap,
) -> Result<Response> {
    let id = ProductId::new(id);
    let htmx = is_htmx(&headers);
    let view = state.detail_views().for_product(visitor.id, &id);

    let plan = {
        let mut view = view.lock().await;
        if query.poll {
            view.navigate(id.clone())
        } else {
            view.load(id.clone())
        }
    };
    let scroll_to_top = plan.scroll_to_top && !query.poll;
    execute_plan(state.api(), &view, plan).await;

    let sections = DetailSections::capture(&*view.lock().await, &id);
    if !htmx {
        return Ok(sections.into_page().into_response());
    }

    let mut response = sections.into_fragment().into_response();
    if scroll_to_top {
        response.headers_mut().insert(
            HX_TRIGGER,
            axum::http::HeaderValue::from_static(SCROLL_TO_TOP_EVENT),
        );
    }
    Ok(response)
}

/// Display one page of reviews.
///
/// Only a page change re-fetches; repeating the current page renders what is
/// already there.
#[instrument(skip_all, fields(id = %id, page = ?query.page))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReviewsQuery>,
    visitor: Visitor,
) -> Result<ReviewsTemplate> {
    let id = ProductId::new(id);
    let page = query.page.unwrap_or(1);
    let view = state.detail_views().for_product(visitor.id, &id);

    let plan = {
        let mut view = view.lock().await;
        if view.product_id() == Some(&id) {
            view.set_page(page)
        } else {
            view.show_reviews(id.clone(), page)
        }
    };
    execute_plan(state.api(), &view, plan).await;

    let sections = DetailSections::capture(&*view.lock().await, &id);
    Ok(ReviewsTemplate {
        product_id: sections.product_id,
        reviews: sections.reviews,
        reviews_poll: true,
    })
}

/// A review was submitted for this product.
///
/// Re-fetches the product (its rating summary changed) and the current
/// review page.
#[instrument(skip_all, fields(id = %id))]
pub async fn review_submitted(
    State(state): State<AppState>,
    Path(id): Path<String>,
    visitor: Visitor,
) -> Result<ProductDetailTemplate> {
    let id = ProductId::new(id);
    let view = state.detail_views().for_product(visitor.id, &id);

    let plan = {
        let mut view = view.lock().await;
        if view.product_id() == Some(&id) {
            view.review_submitted()
        } else {
            view.load(id.clone())
        }
    };
    add_breadcrumb("reviews", "Review submitted", Some(&[("product_id", id.as_str())]));
    execute_plan(state.api(), &view, plan).await;

    let sections = DetailSections::capture(&*view.lock().await, &id);
    Ok(sections.into_fragment())
}
