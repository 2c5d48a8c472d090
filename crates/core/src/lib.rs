//! Jocestech Core - Shared domain types and client-side state.
//!
//! This crate provides the pieces of the storefront that do not touch the
//! network:
//! - [`types`] - Product, review and price types as served by the backend API
//! - [`filter`] - Filter state, control-event normalization and option derivation
//! - [`detail`] - Fetch orchestration for the product detail view
//!
//! # Architecture
//!
//! The core crate contains only types and state machines - no I/O, no HTTP
//! clients, no templates. The storefront binary drives these state machines
//! and performs the actual requests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod detail;
pub mod filter;
pub mod types;

pub use types::*;
