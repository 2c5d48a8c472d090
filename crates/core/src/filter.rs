//! Product filter state and control-event normalization.
//!
//! The filter panel renders one control per [`FilterControl`] variant. Every
//! interaction with a control arrives as a raw [`ControlEvent`]; the control
//! normalizes it into exactly one [`FilterUpdate`], and [`FilterStore::dispatch`]
//! replaces the matching field of the [`FilterState`].
//!
//! # Invariants
//!
//! - The selected price always lies within the price bounds.
//! - Category, company and color are always `"all"` or one of the options
//!   derived from the product collection.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, Product};

/// Sentinel option meaning "no filter on this field".
pub const ALL: &str = "all";

/// Errors produced while normalizing or applying a filter interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Unknown filter control: {0}")]
    UnknownControl(String),

    #[error("Missing {payload} for {control} control")]
    MissingPayload {
        control: FilterControl,
        payload: &'static str,
    },

    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    #[error("Unknown {field} option: {value}")]
    UnknownOption { field: FilterField, value: String },

    #[error("Unknown sort order: {0}")]
    UnknownSort(String),
}

// =============================================================================
// Fields and Controls
// =============================================================================

/// A field of the filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Text,
    Category,
    Company,
    Color,
    Price,
    Shipping,
}

impl FilterField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Category => "category",
            Self::Company => "company",
            Self::Color => "color",
            Self::Price => "price",
            Self::Shipping => "shipping",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A control rendered in the filter panel.
///
/// The two category pickers are distinct controls that write the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterControl {
    /// Free-text search input.
    SearchInput,
    /// Category list rendered as buttons (wide screens).
    CategoryButton,
    /// Category dropdown (small screens).
    CategorySelect,
    /// Company dropdown.
    CompanySelect,
    /// Color swatch buttons, including the "all" swatch.
    ColorSwatch,
    /// Price range slider.
    PriceRange,
    /// Free-shipping checkbox.
    ShippingToggle,
}

impl FilterControl {
    /// Every control, in panel order.
    pub const ALL: [Self; 7] = [
        Self::SearchInput,
        Self::CategoryButton,
        Self::CategorySelect,
        Self::CompanySelect,
        Self::ColorSwatch,
        Self::PriceRange,
        Self::ShippingToggle,
    ];

    /// The `name` attribute the control is rendered with.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SearchInput => "text",
            Self::CategoryButton => "category",
            Self::CategorySelect => "categoryOption",
            Self::CompanySelect => "company",
            Self::ColorSwatch => "color",
            Self::PriceRange => "price",
            Self::ShippingToggle => "shipping",
        }
    }

    /// The state field this control writes.
    #[must_use]
    pub const fn field(self) -> FilterField {
        match self {
            Self::SearchInput => FilterField::Text,
            Self::CategoryButton | Self::CategorySelect => FilterField::Category,
            Self::CompanySelect => FilterField::Company,
            Self::ColorSwatch => FilterField::Color,
            Self::PriceRange => FilterField::Price,
            Self::ShippingToggle => FilterField::Shipping,
        }
    }

    /// Turn a raw interaction into a single field update.
    ///
    /// Price values are clamped into `bounds`.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::MissingPayload` when the event lacks the data the
    /// control reads, or `FilterError::InvalidPrice` for a non-numeric price.
    pub fn normalize(
        self,
        event: &ControlEvent,
        bounds: PriceBounds,
    ) -> Result<FilterUpdate, FilterError> {
        let update = match self {
            Self::SearchInput => FilterUpdate::Text(event.value.clone()),
            // The button's visible label, not its value attribute.
            Self::CategoryButton => {
                let text = event.text.as_deref().ok_or(FilterError::MissingPayload {
                    control: self,
                    payload: "button text",
                })?;
                FilterUpdate::Category(text.trim().to_string())
            }
            Self::CategorySelect => FilterUpdate::Category(event.value.clone()),
            Self::CompanySelect => FilterUpdate::Company(event.value.clone()),
            // The swatch's color data attribute, not its value.
            Self::ColorSwatch => {
                let color = event.color.as_deref().ok_or(FilterError::MissingPayload {
                    control: self,
                    payload: "color attribute",
                })?;
                FilterUpdate::Color(color.to_string())
            }
            Self::PriceRange => {
                FilterUpdate::Price(parse_price(&event.value)?.clamp_between(bounds.min, bounds.max))
            }
            Self::ShippingToggle => FilterUpdate::Shipping(event.checked),
        };
        Ok(update)
    }
}

impl FromStr for FilterControl {
    type Err = FilterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|control| control.name() == name)
            .ok_or_else(|| FilterError::UnknownControl(name.to_string()))
    }
}

impl fmt::Display for FilterControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coerce a slider value to whole cents.
#[allow(clippy::cast_possible_truncation)] // clamped to the catalog range afterwards
fn parse_price(raw: &str) -> Result<Price, FilterError> {
    let trimmed = raw.trim();
    if let Ok(cents) = trimmed.parse::<i64>() {
        return Ok(Price::from_cents(cents));
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Price::from_cents(value.round() as i64)),
        _ => Err(FilterError::InvalidPrice(raw.to_string())),
    }
}

// =============================================================================
// Events and Updates
// =============================================================================

/// A raw interaction with a filter control.
///
/// Carries everything a control might read; each control only looks at the
/// part that is meaningful for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlEvent {
    /// The control's `name` attribute.
    pub name: String,
    /// The control's `value` attribute.
    pub value: String,
    /// Visible text of the element.
    pub text: Option<String>,
    /// The element's color data attribute.
    pub color: Option<String>,
    /// Checked state for checkboxes.
    pub checked: bool,
}

impl ControlEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }
}

/// A normalized replacement for one filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Text(String),
    Category(String),
    Company(String),
    Color(String),
    Price(Price),
    Shipping(bool),
}

impl FilterUpdate {
    #[must_use]
    pub const fn field(&self) -> FilterField {
        match self {
            Self::Text(_) => FilterField::Text,
            Self::Category(_) => FilterField::Category,
            Self::Company(_) => FilterField::Company,
            Self::Color(_) => FilterField::Color,
            Self::Price(_) => FilterField::Price,
            Self::Shipping(_) => FilterField::Shipping,
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// Lowest and highest selectable price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: Price,
    pub max: Price,
}

impl PriceBounds {
    /// Bounds for a collection: from zero up to the most expensive product.
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        let max = products
            .iter()
            .map(|p| p.price)
            .max()
            .unwrap_or(Price::ZERO)
            .max(Price::ZERO);
        Self {
            min: Price::ZERO,
            max,
        }
    }
}

/// The visitor's current filter selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub text: String,
    pub category: String,
    pub company: String,
    pub color: String,
    pub price: Price,
    pub min_price: Price,
    pub max_price: Price,
    pub shipping: bool,
}

impl FilterState {
    /// Unfiltered state for the given bounds.
    #[must_use]
    pub fn defaults(bounds: PriceBounds) -> Self {
        Self {
            text: String::new(),
            category: ALL.to_string(),
            company: ALL.to_string(),
            color: ALL.to_string(),
            price: bounds.max,
            min_price: bounds.min,
            max_price: bounds.max,
            shipping: false,
        }
    }

    #[must_use]
    pub const fn bounds(&self) -> PriceBounds {
        PriceBounds {
            min: self.min_price,
            max: self.max_price,
        }
    }

    /// Whether a product passes every active filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let text = self.text.trim().to_lowercase();
        if !text.is_empty() && !product.name.to_lowercase().contains(&text) {
            return false;
        }
        if !is_all(&self.category) && !same_option(&product.category, &self.category) {
            return false;
        }
        if !is_all(&self.company) && !same_option(&product.company, &self.company) {
            return false;
        }
        if !is_all(&self.color) && !product.colors.iter().any(|c| same_option(c, &self.color)) {
            return false;
        }
        if product.price > self.price {
            return false;
        }
        !self.shipping || product.free_shipping
    }
}

fn is_all(value: &str) -> bool {
    value.eq_ignore_ascii_case(ALL)
}

fn same_option(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

// =============================================================================
// Option Derivation
// =============================================================================

/// A product field that filter options are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    Category,
    Company,
    /// List-valued; flattened across products.
    Colors,
}

/// Distinct values of `field` across `products`, preceded by `"all"`.
///
/// Values are compared case-insensitively; the first spelling seen is kept
/// for display. Empty values are skipped.
#[must_use]
pub fn unique_values(products: &[Product], field: OptionField) -> Vec<String> {
    let values: Box<dyn Iterator<Item = &String> + '_> = match field {
        OptionField::Category => Box::new(products.iter().map(|p| &p.category)),
        OptionField::Company => Box::new(products.iter().map(|p| &p.company)),
        OptionField::Colors => Box::new(products.iter().flat_map(|p| p.colors.iter())),
    };

    let mut seen: HashSet<String> = HashSet::from([ALL.to_string()]);
    let mut options = vec![ALL.to_string()];
    for value in values {
        if value.trim().is_empty() {
            continue;
        }
        if seen.insert(value.to_lowercase()) {
            options.push(value.clone());
        }
    }
    options
}

/// Selectable options for every option-backed field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub companies: Vec<String>,
    pub colors: Vec<String>,
}

impl FilterOptions {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        Self {
            categories: unique_values(products, OptionField::Category),
            companies: unique_values(products, OptionField::Company),
            colors: unique_values(products, OptionField::Colors),
        }
    }

    fn for_field(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::Category => &self.categories,
            FilterField::Company => &self.companies,
            FilterField::Color => &self.colors,
            FilterField::Text | FilterField::Price | FilterField::Shipping => &[],
        }
    }

    /// The displayed spelling of `value` for `field`, if it is an option.
    fn resolve(&self, field: FilterField, value: &str) -> Option<&str> {
        self.for_field(field)
            .iter()
            .find(|option| same_option(option, value))
            .map(String::as_str)
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    PriceLowest,
    PriceHighest,
    NameAz,
    NameZa,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [
        Self::PriceLowest,
        Self::PriceHighest,
        Self::NameAz,
        Self::NameZa,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceLowest => "price-lowest",
            Self::PriceHighest => "price-highest",
            Self::NameAz => "name-a",
            Self::NameZa => "name-z",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PriceLowest => "price (lowest)",
            Self::PriceHighest => "price (highest)",
            Self::NameAz => "name (a - z)",
            Self::NameZa => "name (z - a)",
        }
    }

    fn sort(self, products: &mut [&Product]) {
        match self {
            Self::PriceLowest => products.sort_by_key(|p| p.price),
            Self::PriceHighest => products.sort_by_key(|p| std::cmp::Reverse(p.price)),
            Self::NameAz => products.sort_by_cached_key(|p| p.name.to_lowercase()),
            Self::NameZa => {
                products.sort_by_cached_key(|p| std::cmp::Reverse(p.name.to_lowercase()));
            }
        }
    }
}

impl FromStr for SortOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| FilterError::UnknownSort(s.to_string()))
    }
}

// =============================================================================
// Store
// =============================================================================

/// Filter state bound to the product collection it filters.
///
/// All mutation goes through [`FilterStore::dispatch`] (or [`FilterStore::clear`]),
/// which replaces one field at a time and enforces the invariants.
#[derive(Debug, Clone)]
pub struct FilterStore {
    products: Arc<[Product]>,
    options: FilterOptions,
    bounds: PriceBounds,
    filters: FilterState,
}

impl FilterStore {
    /// Create a store with default filters for `products`.
    #[must_use]
    pub fn new(products: impl Into<Arc<[Product]>>) -> Self {
        let products = products.into();
        let options = FilterOptions::from_products(&products);
        let bounds = PriceBounds::from_products(&products);
        Self {
            products,
            options,
            bounds,
            filters: FilterState::defaults(bounds),
        }
    }

    /// Create a store and re-apply a previously saved selection.
    ///
    /// Saved values that are no longer valid for `products` fall back to their
    /// defaults. A saved price at its old maximum stays at the new maximum.
    #[must_use]
    pub fn restore(products: impl Into<Arc<[Product]>>, saved: Option<FilterState>) -> Self {
        let mut store = Self::new(products);
        let Some(saved) = saved else {
            return store;
        };

        let price = if saved.price >= saved.max_price {
            store.bounds.max
        } else {
            saved.price
        };
        let updates = [
            FilterUpdate::Text(saved.text),
            FilterUpdate::Category(saved.category),
            FilterUpdate::Company(saved.company),
            FilterUpdate::Color(saved.color),
            FilterUpdate::Price(price),
            FilterUpdate::Shipping(saved.shipping),
        ];
        for update in updates {
            // Stale selections keep their default.
            let _ = store.dispatch(update);
        }
        store
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    #[must_use]
    pub const fn options(&self) -> &FilterOptions {
        &self.options
    }

    #[must_use]
    pub const fn bounds(&self) -> PriceBounds {
        self.bounds
    }

    /// Normalize a raw control event against this store's bounds.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::UnknownControl` for an unrecognized control name,
    /// or any error from [`FilterControl::normalize`].
    pub fn normalize(&self, event: &ControlEvent) -> Result<FilterUpdate, FilterError> {
        event.name.parse::<FilterControl>()?.normalize(event, self.bounds)
    }

    /// Normalize and apply a raw control event.
    ///
    /// # Errors
    ///
    /// See [`FilterStore::normalize`] and [`FilterStore::dispatch`]. The state is
    /// unchanged on error.
    pub fn handle_event(&mut self, event: &ControlEvent) -> Result<FilterField, FilterError> {
        let update = self.normalize(event)?;
        self.dispatch(update)
    }

    /// Replace one field of the filter state.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::UnknownOption` when a category, company or color is
    /// neither `"all"` nor present in the collection. The state is unchanged on
    /// error.
    pub fn dispatch(&mut self, update: FilterUpdate) -> Result<FilterField, FilterError> {
        let field = update.field();
        match update {
            FilterUpdate::Text(text) => self.filters.text = text,
            FilterUpdate::Category(value) => self.filters.category = self.option(field, &value)?,
            FilterUpdate::Company(value) => self.filters.company = self.option(field, &value)?,
            FilterUpdate::Color(value) => self.filters.color = self.option(field, &value)?,
            FilterUpdate::Price(price) => {
                self.filters.price = price.clamp_between(self.bounds.min, self.bounds.max);
            }
            FilterUpdate::Shipping(shipping) => self.filters.shipping = shipping,
        }
        Ok(field)
    }

    /// Reset every field to the defaults derived from the full collection.
    pub fn clear(&mut self) {
        self.filters = FilterState::defaults(self.bounds);
    }

    /// Products passing the current filters, in `sort` order.
    #[must_use]
    pub fn filtered_products(&self, sort: SortOrder) -> Vec<&Product> {
        let mut products: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| self.filters.matches(p))
            .collect();
        sort.sort(&mut products);
        products
    }

    fn option(&self, field: FilterField, value: &str) -> Result<String, FilterError> {
        if is_all(value) {
            return Ok(ALL.to_string());
        }
        self.options
            .resolve(field, value)
            .map(str::to_string)
            .ok_or_else(|| FilterError::UnknownOption {
                field,
                value: value.to_string(),
            })
    }
}
