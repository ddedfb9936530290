use crate::catalog::{
    Category, CategoryGroup, FilterParseError, FilterState, Gender, Listing, PriceRange, SortBy,
};
use serde::{Deserialize, Serialize};

/// Query string accepted by the listing routes. Empty values and `all` mean
/// "no constraint", matching the storefront's select controls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingsQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

impl ListingsQuery {
    pub fn to_filter_state(&self) -> Result<FilterState, FilterParseError> {
        let gender = match constraint(&self.gender) {
            Some(raw) => {
                Some(Gender::parse(raw).ok_or_else(|| FilterParseError::Gender(raw.to_string()))?)
            }
            None => None,
        };
        Ok(FilterState {
            search_query: self.q.clone().unwrap_or_default(),
            category: constraint(&self.category).and_then(Category::from_label),
            gender,
            size: constraint(&self.size).map(str::to_string),
            brand: constraint(&self.brand).map(str::to_string),
            color: constraint(&self.color).map(str::to_string),
            price_range: self
                .price
                .as_deref()
                .map(PriceRange::parse)
                .transpose()?
                .unwrap_or_default(),
            sort_by: self
                .sort
                .as_deref()
                .map(SortBy::from_param)
                .unwrap_or_default(),
            active_category: constraint(&self.section).and_then(Category::from_label),
        })
    }
}

fn constraint(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

#[derive(Debug, Serialize)]
pub struct ListingsResponse<'a> {
    pub count: usize,
    pub sort: &'static str,
    pub listings: Vec<&'a Listing>,
}

#[derive(Debug, Serialize)]
pub struct GroupedResponse<'a> {
    pub sort: &'static str,
    pub groups: Vec<GroupPayload<'a>>,
}

#[derive(Debug, Serialize)]
pub struct GroupPayload<'a> {
    pub category: String,
    pub count: usize,
    pub listings: Vec<&'a Listing>,
}

impl<'a> From<CategoryGroup<'a>> for GroupPayload<'a> {
    fn from(group: CategoryGroup<'a>) -> Self {
        Self {
            count: group.len(),
            category: group.category,
            listings: group.listings,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityQuery {
    #[serde(default)]
    pub window_hours: Option<i64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
