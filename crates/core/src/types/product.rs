//! Product records as served by the backend API.

use serde::{Deserialize, Deserializer, Serialize};

use super::{Price, ProductId};

/// Number of leading characters of a box-contents entry that form its code
/// (e.g. `"1x "` in `"1x USB-C cable"`).
const BOX_CODE_LEN: usize = 3;

/// A product in the catalog.
///
/// Owned by the backend; the storefront never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Document ID, which doubles as the SKU.
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inventory: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub free_shipping: bool,
    #[serde(default)]
    pub features: String,
    /// Box contents, each entry prefixed by a short quantity code.
    #[serde(default, rename = "box")]
    pub box_contents: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<String>,
    #[serde(default)]
    pub average_rating: f64,
    /// Review counts grouped by star rating.
    #[serde(default)]
    pub group_rating: Vec<RatingGroup>,
    #[serde(default)]
    pub num_of_reviews: u32,
}

/// Count of reviews that gave a particular star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingGroup {
    #[serde(alias = "_id")]
    pub rating: u8,
    pub count: u32,
}

/// A box-contents entry split for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxItem<'a> {
    pub code: &'a str,
    pub description: &'a str,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory > 0
    }

    /// Box contents split into code and description.
    pub fn box_items(&self) -> impl Iterator<Item = BoxItem<'_>> {
        self.box_contents.iter().map(|entry| BoxItem::split(entry))
    }

    /// First image, if the product has any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image.first().map(String::as_str)
    }
}

impl<'a> BoxItem<'a> {
    /// Split an entry after its first three characters.
    ///
    /// Entries shorter than the code width become a code with an empty
    /// description.
    #[must_use]
    pub fn split(entry: &'a str) -> Self {
        let at = entry
            .char_indices()
            .nth(BOX_CODE_LEN)
            .map_or(entry.len(), |(idx, _)| idx);
        let (code, description) = entry.split_at(at);
        Self { code, description }
    }
}

/// Accept either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Missing(Option<()>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
        OneOrMany::Missing(_) => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_product() {
        let json = r##"{
            "_id": "64f1",
            "name": "XX99 Mark II",
            "price": 299900,
            "description": "Headphones",
            "inventory": 12,
            "category": "Headphones",
            "company": "Audiophile",
            "colors": ["#000", "#fff"],
            "freeShipping": true,
            "features": "Lots",
            "box": ["1x Headphone unit", "2x Replacement earcups"],
            "image": "https://cdn.example.com/xx99.jpg",
            "averageRating": 4.5,
            "groupRating": [{"_id": 5, "count": 3}, {"_id": 4, "count": 1}],
            "numOfReviews": 4
        }"##;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "64f1");
        assert_eq!(product.price, Price::from_cents(299_900));
        assert!(product.free_shipping);
        assert_eq!(product.box_contents.len(), 2);
        assert_eq!(product.image, vec!["https://cdn.example.com/xx99.jpg"]);
        assert_eq!(product.group_rating[0], RatingGroup { rating: 5, count: 3 });
        assert_eq!(product.num_of_reviews, 4);
    }

    #[test]
    fn test_deserialize_minimal_product() {
        let json = r#"{"id": "p1", "name": "Cable", "price": 999, "image": ["a.jpg", "b.jpg"]}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.inventory, 0);
        assert!(product.colors.is_empty());
        assert_eq!(product.primary_image(), Some("a.jpg"));
        assert!(!product.in_stock());
    }

    #[test]
    fn test_box_item_split() {
        let item = BoxItem::split("1x User manual");
        assert_eq!(item.code, "1x ");
        assert_eq!(item.description, "User manual");
    }

    #[test]
    fn test_box_item_split_short_entry() {
        let item = BoxItem::split("1x");
        assert_eq!(item.code, "1x");
        assert_eq!(item.description, "");
    }

    #[test]
    fn test_box_item_split_multibyte() {
        let item = BoxItem::split("1×\u{a0}Câble");
        assert_eq!(item.code, "1×\u{a0}");
        assert_eq!(item.description, "Câble");
    }
}
