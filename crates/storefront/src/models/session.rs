//! Session-related types.
//!
//! The storefront has no accounts. A session only identifies the visitor;
//! their filter selection and detail views are kept server-side under that
//! identifier.

/// Session keys for visitor data.
pub mod keys {
    /// Key for the visitor's random identifier (`Uuid`).
    ///
    /// Keys per-visitor state held outside the session, such as the product
    /// detail views and filter selection.
    pub const VISITOR: &str = "visitor";
}
