//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for the backend's domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod review;

pub use id::*;
pub use price::Price;
pub use product::{BoxItem, Product, RatingGroup};
pub use review::{Review, ReviewAuthor, ReviewPage};
