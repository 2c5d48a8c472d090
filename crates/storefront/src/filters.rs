//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Highest star rating.
const MAX_STARS: usize = 5;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a rating as filled and empty stars, rounded to the nearest star.
///
/// Non-numeric input renders as zero stars.
///
/// Usage in templates: `{{ product.average_rating|stars }}`
#[askama::filter_fn]
pub fn stars(rating: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(&rating.to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5
fn star_string(rating: &str) -> String {
    let rating = rating.trim().parse::<f64>().unwrap_or(0.0);
    let filled = if rating.is_finite() {
        rating.round().clamp(0.0, 5.0) as usize
    } else {
        0
    };
    let mut out = "★".repeat(filled);
    out.push_str(&"☆".repeat(MAX_STARS - filled));
    out
}
