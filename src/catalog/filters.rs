use crate::catalog::listing::{Category, Gender};
use serde::Serialize;
use thiserror::Error;

/// User-chosen search text, attribute constraints, price bound and ordering.
///
/// Owned by the caller and passed by reference into the view functions; the
/// pipeline never writes to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub search_query: String,
    pub category: Option<Category>,
    pub gender: Option<Gender>,
    pub size: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub price_range: PriceRange,
    pub sort_by: SortBy,
    pub active_category: Option<Category>,
}

impl FilterState {
    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = range;
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_active_category(mut self, category: Category) -> Self {
        self.active_category = Some(category);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceRange {
    #[default]
    Any,
    Between {
        min: f64,
        max: f64,
    },
    AtLeast {
        min: f64,
    },
}

impl PriceRange {
    /// Parses the storefront's price select values: `"10-50"`, `"100-"`, or
    /// `""`/`"all"` for no bound.
    pub fn parse(input: &str) -> Result<Self, FilterParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(PriceRange::Any);
        }
        let invalid = || FilterParseError::PriceRange(trimmed.to_string());
        let (min_raw, max_raw) = trimmed.split_once('-').ok_or_else(invalid)?;
        let min = parse_bound(min_raw).ok_or_else(invalid)?;
        if max_raw.trim().is_empty() {
            return Ok(PriceRange::AtLeast { min });
        }
        let max = parse_bound(max_raw).ok_or_else(invalid)?;
        if max < min {
            return Err(invalid());
        }
        Ok(PriceRange::Between { min, max })
    }

    pub fn contains(&self, price: f64) -> bool {
        match *self {
            PriceRange::Any => true,
            PriceRange::Between { min, max } => min <= price && price <= max,
            PriceRange::AtLeast { min } => price >= min,
        }
    }
}

fn parse_bound(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    PriceLow,
    PriceHigh,
    Popular,
    Alphabetical,
    Category,
}

impl SortBy {
    /// Unrecognized keys fall back to `Newest`, mirroring the storefront default.
    pub fn from_param(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "oldest" => SortBy::Oldest,
            "price-low" => SortBy::PriceLow,
            "price-high" => SortBy::PriceHigh,
            "popular" => SortBy::Popular,
            "alphabetical" => SortBy::Alphabetical,
            "category" => SortBy::Category,
            _ => SortBy::Newest,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Oldest => "oldest",
            SortBy::PriceLow => "price-low",
            SortBy::PriceHigh => "price-high",
            SortBy::Popular => "popular",
            SortBy::Alphabetical => "alphabetical",
            SortBy::Category => "category",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterParseError {
    #[error("invalid price range `{0}`; expected `min-max` or `min-`")]
    PriceRange(String),
    #[error("unknown gender `{0}`")]
    Gender(String),
}
