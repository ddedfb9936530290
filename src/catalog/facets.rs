use crate::catalog::listing::Listing;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogFacets {
    pub categories: Vec<FacetValue>,
    pub brands: Vec<FacetValue>,
    pub colors: Vec<FacetValue>,
    pub sizes: Vec<FacetValue>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Distinct values present in the catalog, for populating filter controls.
pub fn collect_facets(listings: &[Listing]) -> CatalogFacets {
    let prices = listings.iter().map(|listing| listing.price);
    CatalogFacets {
        categories: tally(listings.iter().map(|l| Some(l.group_label()))),
        brands: tally(listings.iter().map(|l| l.brand.as_deref())),
        colors: tally(listings.iter().map(|l| l.color.as_deref())),
        sizes: tally(listings.iter().map(|l| l.size.as_deref())),
        min_price: prices.clone().reduce(f64::min),
        max_price: prices.reduce(f64::max),
    }
}

fn tally<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<FacetValue> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.flatten() {
        *counts.entry(value).or_default() += 1;
    }
    let mut facets: Vec<FacetValue> = counts
        .into_iter()
        .map(|(value, count)| FacetValue {
            value: value.to_string(),
            count,
        })
        .collect();
    facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    facets
}
