//! Visitor identity extractor.
//!
//! Every visitor gets a random identifier stored in their session on first
//! contact. Handlers use it to key per-visitor state held in [`AppState`].
//!
//! [`AppState`]: crate::state::AppState

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session_keys;

/// Extractor for the current visitor.
///
/// Requires the session layer. The identifier is created and stored if the
/// session does not carry one yet.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>, visitor: Visitor) -> impl IntoResponse {
///     let selection = state.filter_selections().for_visitor(visitor.id);
///     // ...
/// }
/// ```
pub struct Visitor {
    pub id: Uuid,
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let id = if let Some(id) = session.get::<Uuid>(session_keys::VISITOR).await? {
            id
        } else {
            let id = Uuid::new_v4();
            session.insert(session_keys::VISITOR, id).await?;
            tracing::debug!(visitor = %id, "New visitor");
            id
        };

        Ok(Self { id })
    }
}
