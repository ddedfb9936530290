use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt;

/// Label used for listings that carry no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub gender: Option<Gender>,
    pub size: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub condition: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub seller_name: Option<String>,
}

impl Listing {
    /// Category label used for grouping; absent categories fall into `Uncategorized`.
    pub fn group_label(&self) -> &str {
        self.category
            .as_ref()
            .map(Category::label)
            .unwrap_or(UNCATEGORIZED)
    }

    /// Category label used for ordering; absent categories sort as the empty string.
    pub fn sort_label(&self) -> &str {
        self.category.as_ref().map(Category::label).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Climbing,
    Skiing,
    Hiking,
    Camping,
    Mountaineering,
    Snowboarding,
    Cycling,
    WaterSports,
    Apparel,
    Footwear,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 10] = [
        Category::Climbing,
        Category::Skiing,
        Category::Hiking,
        Category::Camping,
        Category::Mountaineering,
        Category::Snowboarding,
        Category::Cycling,
        Category::WaterSports,
        Category::Apparel,
        Category::Footwear,
    ];

    pub fn label(&self) -> &str {
        match self {
            Category::Climbing => "Climbing",
            Category::Skiing => "Skiing",
            Category::Hiking => "Hiking",
            Category::Camping => "Camping",
            Category::Mountaineering => "Mountaineering",
            Category::Snowboarding => "Snowboarding",
            Category::Cycling => "Cycling",
            Category::WaterSports => "Water Sports",
            Category::Apparel => "Apparel",
            Category::Footwear => "Footwear",
            Category::Other(label) => label,
        }
    }

    /// Resolves a label from the listing source or a query string. Known
    /// categories match case-insensitively and accept `-`/`_` for spaces;
    /// anything else is kept verbatim as `Other`. Blank input has no category.
    pub fn from_label(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = trimmed.to_lowercase().replace(['-', '_'], " ");
        let known = Self::KNOWN
            .iter()
            .find(|category| category.label().to_lowercase() == normalized)
            .cloned();
        Some(known.unwrap_or_else(|| Category::Other(trimmed.to_string())))
    }

    /// Label equality ignoring case, so `Other("fly fishing")` from a query
    /// string selects listings tagged "Fly Fishing".
    pub fn matches_label(&self, label: &str) -> bool {
        self.label().to_lowercase() == label.to_lowercase()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::from_label(&value).unwrap_or(Category::Other(value))
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Men,
    Women,
    Unisex,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Men => "Men",
            Gender::Women => "Women",
            Gender::Unisex => "Unisex",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "men" | "mens" | "men's" => Some(Gender::Men),
            "women" | "womens" | "women's" => Some(Gender::Women),
            "unisex" => Some(Gender::Unisex),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_resolve_case_insensitively() {
        assert_eq!(Category::from_label("hiking"), Some(Category::Hiking));
        assert_eq!(
            Category::from_label("water-sports"),
            Some(Category::WaterSports)
        );
        assert_eq!(
            Category::from_label("  Water Sports "),
            Some(Category::WaterSports)
        );
    }

    #[test]
    fn unknown_category_is_kept_verbatim() {
        assert_eq!(
            Category::from_label("Fly Fishing"),
            Some(Category::Other("Fly Fishing".into()))
        );
        assert_eq!(Category::from_label("   "), None);
    }

    #[test]
    fn other_labels_match_regardless_of_case() {
        let wanted = Category::from_label("fly fishing").expect("category");
        assert!(wanted.matches_label("Fly Fishing"));
        assert!(!wanted.matches_label("Fishing"));
        assert!(Category::WaterSports.matches_label("water sports"));
    }

    #[test]
    fn category_serializes_as_label() {
        let value = serde_json::to_value(Category::WaterSports).expect("serialize");
        assert_eq!(value, serde_json::json!("Water Sports"));
        let back: Category = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, Category::WaterSports);
    }

    #[test]
    fn gender_parse_accepts_storefront_spellings() {
        assert_eq!(Gender::parse("Women"), Some(Gender::Women));
        assert_eq!(Gender::parse("men's"), Some(Gender::Men));
        assert_eq!(Gender::parse("kids"), None);
    }
}
