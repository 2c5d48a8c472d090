//! Product listing and filter panel handlers.
//!
//! The visitor's filter selection is kept in [`FilterSelections`], keyed by
//! the session's visitor id. Each request rebuilds a [`FilterStore`] from the
//! cached catalog and the saved selection, applies at most one update through
//! the store's reducer, saves the result and renders the panel plus the
//! filtered grid.
//!
//! [`FilterSelections`]: crate::selections::FilterSelections

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, instrument};

use jocestech_core::Product;
use jocestech_core::filter::{ControlEvent, FilterControl, FilterStore, SortOrder};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::Visitor;
use crate::routes::is_htmx;
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// A selectable filter option.
#[derive(Clone)]
pub struct OptionView {
    /// Displayed spelling.
    pub label: String,
    /// Lowercased form used as the element's value attribute.
    pub value: String,
    pub selected: bool,
}

/// Filter panel display data for templates.
#[derive(Clone)]
pub struct FilterPanelView {
    pub text: String,
    pub categories: Vec<OptionView>,
    pub companies: Vec<OptionView>,
    pub colors: Vec<OptionView>,
    /// Selected price, formatted.
    pub price: String,
    pub price_cents: i64,
    pub min_cents: i64,
    pub max_cents: i64,
    pub shipping: bool,
}

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub company: String,
    pub image: Option<String>,
    pub in_stock: bool,
    pub free_shipping: bool,
}

/// Sort selector option.
#[derive(Clone)]
pub struct SortOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Everything the listing fragment renders.
#[derive(Clone)]
pub struct ListingView {
    pub panel: FilterPanelView,
    pub products: Vec<ProductCardView>,
    pub total: usize,
    pub sort: &'static str,
    pub sort_options: Vec<SortOptionView>,
    /// Control names the panel renders with.
    pub controls: ControlNames,
}

/// The `name` each control posts, so templates never hard-code them.
#[derive(Clone, Copy)]
pub struct ControlNames {
    pub text: &'static str,
    pub category: &'static str,
    pub category_option: &'static str,
    pub company: &'static str,
    pub color: &'static str,
    pub price: &'static str,
    pub shipping: &'static str,
}

impl Default for ControlNames {
    fn default() -> Self {
        Self {
            text: FilterControl::SearchInput.name(),
            category: FilterControl::CategoryButton.name(),
            category_option: FilterControl::CategorySelect.name(),
            company: FilterControl::CompanySelect.name(),
            color: FilterControl::ColorSwatch.name(),
            price: FilterControl::PriceRange.name(),
            shipping: FilterControl::ShippingToggle.name(),
        }
    }
}

impl ListingView {
    #[must_use]
    pub fn new(store: &FilterStore, sort: SortOrder) -> Self {
        let filters = store.filters();
        let options = store.options();
        let bounds = store.bounds();

        let option_views = |values: &[String], selected: &str| {
            values
                .iter()
                .map(|value| OptionView {
                    label: value.clone(),
                    value: value.to_lowercase(),
                    selected: value.eq_ignore_ascii_case(selected),
                })
                .collect::<Vec<_>>()
        };

        let panel = FilterPanelView {
            text: filters.text.clone(),
            categories: option_views(&options.categories, &filters.category),
            companies: option_views(&options.companies, &filters.company),
            colors: option_views(&options.colors, &filters.color),
            price: filters.price.to_string(),
            price_cents: filters.price.cents(),
            min_cents: bounds.min.cents(),
            max_cents: bounds.max.cents(),
            shipping: filters.shipping,
        };

        let products: Vec<ProductCardView> = store
            .filtered_products(sort)
            .into_iter()
            .map(ProductCardView::from)
            .collect();

        Self {
            panel,
            total: products.len(),
            products,
            sort: sort.as_str(),
            sort_options: SortOrder::ALL
                .into_iter()
                .map(|order| SortOptionView {
                    value: order.as_str(),
                    label: order.label(),
                    selected: order == sort,
                })
                .collect(),
            controls: ControlNames::default(),
        }
    }
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            company: product.company.clone(),
            image: product.primary_image().map(str::to_string),
            in_stock: product.in_stock(),
            free_shipping: product.free_shipping,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub listing: ListingView,
}

/// Listing fragment (filter panel + grid) for HTMX swaps.
#[derive(Template, WebTemplate)]
#[template(path = "partials/listing.html")]
pub struct ListingTemplate {
    pub listing: ListingView,
}

// =============================================================================
// Forms
// =============================================================================

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub sort: Option<String>,
}

/// A filter control interaction as posted by the panel.
#[derive(Debug, Deserialize)]
pub struct FilterForm {
    /// The control's name, e.g. `categoryOption`.
    pub name: Option<String>,
    #[serde(default)]
    pub value: String,
    /// Visible text of a category button.
    pub text: Option<String>,
    /// Color data attribute of a swatch.
    pub color: Option<String>,
    /// Present only when the shipping checkbox is checked.
    pub checked: Option<String>,
    pub sort: Option<String>,
}

impl FilterForm {
    fn event(&self) -> Result<ControlEvent> {
        let name = self
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest("missing control name".to_string()))?;
        Ok(ControlEvent {
            name,
            value: self.value.clone(),
            text: self.text.clone(),
            color: self.color.clone(),
            checked: self
                .checked
                .as_deref()
                .is_some_and(|v| matches!(v, "true" | "on" | "1")),
        })
    }
}

/// Clear request; only carries the current sort order.
#[derive(Debug, Deserialize)]
pub struct ClearForm {
    pub sort: Option<String>,
}

fn parse_sort(raw: Option<&str>) -> Result<SortOrder> {
    match raw.map(str::trim) {
        None | Some("") => Ok(SortOrder::default()),
        Some(value) => Ok(value.parse()?),
    }
}

async fn load_store(state: &AppState, visitor: &Visitor) -> Result<FilterStore> {
    let products = state.catalog().products().await?;
    let saved = state
        .filter_selections()
        .for_visitor(visitor.id)
        .lock()
        .await
        .clone();
    Ok(FilterStore::restore(products, saved))
}

/// Restore the visitor's store, apply `update` and save the result.
///
/// The selection stays locked from restore to save, so overlapping
/// interactions from one visitor each see the previous one's result. A
/// failed update saves nothing.
async fn update_store<T>(
    state: &AppState,
    visitor: &Visitor,
    update: impl FnOnce(&mut FilterStore) -> Result<T>,
) -> Result<(FilterStore, T)> {
    let products = state.catalog().products().await?;
    let selection = state.filter_selections().for_visitor(visitor.id);
    let mut saved = selection.lock().await;

    let mut store = FilterStore::restore(products, saved.clone());
    let output = update(&mut store)?;
    *saved = Some(store.filters().clone());
    Ok((store, output))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product listing.
///
/// HTMX requests (sort changes) get the listing fragment only.
#[instrument(skip_all, fields(sort = ?query.sort))]
pub async fn index(
    State(state): State<AppState>,
    visitor: Visitor,
    headers: HeaderMap,
    Query(query): Query<ListingQuery>,
) -> Result<Response> {
    let sort = parse_sort(query.sort.as_deref())?;
    let store = load_store(&state, &visitor).await?;
    let listing = ListingView::new(&store, sort);

    if is_htmx(&headers) {
        return Ok(ListingTemplate { listing }.into_response());
    }
    Ok(ProductsIndexTemplate { listing }.into_response())
}

/// Apply one filter control interaction.
///
/// Rejected events leave the saved selection untouched.
#[instrument(skip_all, fields(control = ?form.name))]
pub async fn update_filters(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<FilterForm>,
) -> Result<ListingTemplate> {
    let sort = parse_sort(form.sort.as_deref())?;
    let event = form.event()?;
    let (store, field) =
        update_store(&state, &visitor, |store| Ok(store.handle_event(&event)?)).await?;

    debug!(%field, "Filter updated");
    add_breadcrumb("filter", "Applied filter", Some(&[("field", field.as_str())]));

    Ok(ListingTemplate {
        listing: ListingView::new(&store, sort),
    })
}

/// Reset every filter to its default.
#[instrument(skip_all)]
pub async fn clear_filters(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<ClearForm>,
) -> Result<ListingTemplate> {
    let sort = parse_sort(form.sort.as_deref())?;
    let (store, ()) = update_store(&state, &visitor, |store| {
        store.clear();
        Ok(())
    })
    .await?;
    add_breadcrumb("filter", "Cleared filters", None);

    Ok(ListingTemplate {
        listing: ListingView::new(&store, sort),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{
        body_string, form_request, get_request, htmx_get_request, offline_app, session_cookie,
        test_app,
    };

    /// Product names in a rendered grid, in order.
    fn grid_names(html: &str) -> Vec<&str> {
        html.split("data-product-name=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect()
    }

    async fn start_session(app: &axum::Router) -> (String, String) {
        let response = app
            .clone()
            .oneshot(get_request("/products", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        (cookie, body_string(response).await)
    }

    #[test]
    fn test_filter_form_event() {
        let form = FilterForm {
            name: Some("shipping".to_string()),
            value: String::new(),
            text: None,
            color: None,
            checked: Some("true".to_string()),
            sort: None,
        };
        let event = form.event().unwrap();
        assert_eq!(event.name, "shipping");
        assert!(event.checked);

        let unnamed = FilterForm { name: None, ..form };
        assert!(matches!(unnamed.event(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort(None).unwrap(), SortOrder::PriceLowest);
        assert_eq!(parse_sort(Some("")).unwrap(), SortOrder::PriceLowest);
        assert_eq!(parse_sort(Some("name-z")).unwrap(), SortOrder::NameZa);
        assert!(parse_sort(Some("newest")).is_err());
    }

    #[tokio::test]
    async fn test_listing_page_renders_options_and_products() {
        let app = test_app().await;
        let (_, html) = start_session(&app).await;

        assert!(html.contains("<html"));
        // "laptops" is the same category as "Laptops"; first spelling wins.
        assert!(html.contains(">Laptops<"));
        assert!(!html.contains(">laptops<"));
        assert_eq!(
            grid_names(&html),
            vec!["iPhone 15", "MacBook Air", "ThinkPad X1"]
        );
        assert!(html.contains("3 products found"));
    }

    #[tokio::test]
    async fn test_sort_returns_fragment_for_htmx() {
        let app = test_app().await;
        let response = app
            .oneshot(htmx_get_request("/products?sort=name-z", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(!html.contains("<html"));
        assert_eq!(
            grid_names(&html),
            vec!["ThinkPad X1", "MacBook Air", "iPhone 15"]
        );
    }

    #[tokio::test]
    async fn test_category_select_filters_category() {
        let app = test_app().await;
        let (cookie, _) = start_session(&app).await;

        let response = app
            .oneshot(form_request(
                "/products/filters",
                "name=categoryOption&value=Laptops",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert_eq!(grid_names(&html), vec!["MacBook Air", "ThinkPad X1"]);
        assert!(html.contains("value=\"laptops\" selected"));
    }

    #[tokio::test]
    async fn test_category_button_uses_visible_text() {
        let app = test_app().await;
        let (cookie, _) = start_session(&app).await;

        let response = app
            .oneshot(form_request(
                "/products/filters",
                "name=category&value=ignored&text=Phones",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert_eq!(grid_names(&html), vec!["iPhone 15"]);
    }

    #[tokio::test]
    async fn test_shipping_toggle_persists_across_requests() {
        let app = test_app().await;
        let (cookie, _) = start_session(&app).await;

        let response = app
            .clone()
            .oneshot(form_request(
                "/products/filters",
                "name=shipping&checked=true",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert_eq!(grid_names(&html), vec!["iPhone 15", "ThinkPad X1"]);

        // Saved in the session: a fresh page load keeps it.
        let response = app
            .oneshot(get_request("/products", Some(&cookie)))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert_eq!(grid_names(&html), vec!["iPhone 15", "ThinkPad X1"]);
    }

    #[tokio::test]
    async fn test_color_and_price_filters() {
        let app = test_app().await;
        let (cookie, _) = start_session(&app).await;

        let response = app
            .clone()
            .oneshot(form_request(
                "/products/filters",
                "name=color&value=&color=%23000000",
                Some(&cookie),
            ))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert_eq!(grid_names(&html), vec!["iPhone 15", "ThinkPad X1"]);

        let response = app
            .oneshot(form_request(
                "/products/filters",
                "name=price&value=100000",
                Some(&cookie),
            ))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert_eq!(grid_names(&html), vec!["iPhone 15"]);
        assert!(html.contains("$1,000.00"));
    }

    #[tokio::test]
    async fn test_invalid_events_are_rejected_without_changing_state() {
        let app = test_app().await;
        let (cookie, _) = start_session(&app).await;

        for body in [
            "name=price&value=cheap",
            "name=size&value=xl",
            "name=company&value=Samsung",
            "value=mac",
        ] {
            let response = app
                .clone()
                .oneshot(form_request("/products/filters", body, Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }

        let response = app
            .oneshot(get_request("/products", Some(&cookie)))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert_eq!(grid_names(&html).len(), 3);
    }

    #[tokio::test]
    async fn test_clear_restores_defaults() {
        let app = test_app().await;
        let (cookie, _) = start_session(&app).await;

        app.clone()
            .oneshot(form_request(
                "/products/filters",
                "name=text&value=mac",
                Some(&cookie),
            ))
            .await
            .unwrap();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(form_request("/products/filters/clear", "", Some(&cookie)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let html = body_string(response).await;
            assert_eq!(grid_names(&html).len(), 3);
            assert!(!html.contains("value=\"mac\""));
            assert!(html.contains("Clear filters"));
        }
    }

    #[tokio::test]
    async fn test_overlapping_interactions_both_apply() {
        let app = test_app().await;
        let (cookie, _) = start_session(&app).await;

        let (text, shipping) = tokio::join!(
            app.clone().oneshot(form_request(
                "/products/filters",
                "name=text&value=mac",
                Some(&cookie),
            )),
            app.clone().oneshot(form_request(
                "/products/filters",
                "name=shipping&checked=true",
                Some(&cookie),
            )),
        );
        assert_eq!(text.unwrap().status(), StatusCode::OK);
        assert_eq!(shipping.unwrap().status(), StatusCode::OK);

        let response = app
            .oneshot(get_request("/products", Some(&cookie)))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("value=\"mac\""));
        assert!(html.contains("value=\"true\" checked"));
        // The only "mac" match does not ship free.
        assert!(grid_names(&html).is_empty());
    }

    #[tokio::test]
    async fn test_catalog_outage_is_bad_gateway() {
        let response = offline_app()
            .oneshot(get_request("/products", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
