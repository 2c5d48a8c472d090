//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProductId, ReviewId, UserId};

/// A single customer review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: ReviewId,
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub user: Option<ReviewAuthor>,
    #[serde(default)]
    pub product: Option<ProductId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The reviewer, as populated by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    #[serde(default, alias = "_id")]
    pub id: Option<UserId>,
    pub name: String,
}

impl Review {
    /// Reviewer name, or "Anonymous" when the backend did not populate it.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous")
    }
}

/// One page of reviews for a product.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewPage {
    /// 1-based page number that was requested.
    pub page: u32,
    pub reviews: Vec<Review>,
    /// Total reviews across all pages.
    pub total: u32,
    /// Number of pages available (at least 1).
    pub page_count: u32,
}

impl ReviewPage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_review_with_author() {
        let json = r#"{
            "_id": "r1",
            "rating": 4,
            "title": "Solid",
            "comment": "Good sound",
            "user": {"_id": "u1", "name": "Ada"},
            "product": "p1",
            "createdAt": "2024-03-01T12:00:00Z"
        }"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.author_name(), "Ada");
        assert_eq!(review.product, Some(ProductId::new("p1")));
        assert!(review.created_at.is_some());
    }

    #[test]
    fn test_author_name_fallback() {
        let review: Review = serde_json::from_str(r#"{"id": "r2", "rating": 1}"#).unwrap();
        assert_eq!(review.author_name(), "Anonymous");
    }

    #[test]
    fn test_page_navigation_flags() {
        let page = ReviewPage {
            page: 2,
            reviews: Vec::new(),
            total: 25,
            page_count: 3,
        };
        assert!(page.has_previous());
        assert!(page.has_next());
        assert!(page.is_empty());

        let last = ReviewPage { page: 3, ..page };
        assert!(!last.has_next());
    }
}
