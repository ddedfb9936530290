//! Derives the visible, ordered (and optionally grouped) slice of the catalog
//! from the full listing set and the caller's filter state.
//!
//! Every function here is pure: inputs are borrowed immutably and the output
//! holds references into the caller's listing slice.

use crate::catalog::filters::{FilterState, SortBy};
use crate::catalog::listing::Listing;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup<'a> {
    pub category: String,
    pub listings: Vec<&'a Listing>,
}

impl CategoryGroup<'_> {
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

pub fn compute_visible_listings<'a>(
    listings: &'a [Listing],
    state: &FilterState,
) -> Vec<&'a Listing> {
    compute_visible_listings_at(listings, state, Utc::now())
}

/// Search, attribute filters, price bound and sort, with `now` as the clock
/// for the `popular` ordering.
pub fn compute_visible_listings_at<'a>(
    listings: &'a [Listing],
    state: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a Listing> {
    let query = state.search_query.to_lowercase();
    let brand = state.brand.as_deref().map(str::to_lowercase);
    let color = state.color.as_deref().map(str::to_lowercase);

    let mut visible: Vec<&Listing> = listings
        .iter()
        .filter(|listing| query.is_empty() || matches_search(listing, &query))
        .filter(|listing| {
            state
                .category
                .as_ref()
                .is_none_or(|category| {
                    listing
                        .category
                        .as_ref()
                        .is_some_and(|own| category.matches_label(own.label()))
                })
        })
        .filter(|listing| {
            state
                .gender
                .is_none_or(|gender| listing.gender == Some(gender))
        })
        .filter(|listing| {
            state
                .size
                .as_deref()
                .is_none_or(|size| listing.size.as_deref() == Some(size))
        })
        .filter(|listing| {
            brand
                .as_deref()
                .is_none_or(|needle| contains_lower(listing.brand.as_deref(), needle))
        })
        .filter(|listing| {
            color
                .as_deref()
                .is_none_or(|needle| contains_lower(listing.color.as_deref(), needle))
        })
        .filter(|listing| state.price_range.contains(listing.price))
        .collect();

    sort_listings(&mut visible, state.sort_by, now);
    visible
}

pub fn compute_grouped_listings<'a>(
    listings: &'a [Listing],
    state: &FilterState,
) -> Vec<CategoryGroup<'a>> {
    compute_grouped_listings_at(listings, state, Utc::now())
}

/// Partitions the visible listings by category label. Groups are ordered by
/// size (largest first, ties by label); an active single-category override
/// yields exactly that one group.
pub fn compute_grouped_listings_at<'a>(
    listings: &'a [Listing],
    state: &FilterState,
    now: DateTime<Utc>,
) -> Vec<CategoryGroup<'a>> {
    if listings.is_empty() {
        return Vec::new();
    }
    let visible = compute_visible_listings_at(listings, state, now);

    if let Some(active) = &state.active_category {
        let label = active.label();
        let members = visible
            .into_iter()
            .filter(|listing| active.matches_label(listing.group_label()))
            .collect();
        return vec![CategoryGroup {
            category: label.to_string(),
            listings: members,
        }];
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<CategoryGroup<'a>> = Vec::new();
    for listing in visible {
        let label = listing.group_label();
        let slot = *index.entry(label).or_insert_with(|| {
            groups.push(CategoryGroup {
                category: label.to_string(),
                listings: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].listings.push(listing);
    }

    groups.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.category.cmp(&b.category))
    });
    groups
}

/// Heuristic stand-in for popularity: age in days plus price / 100, lower
/// first. There is no engagement data behind it.
pub fn popularity_score(listing: &Listing, now: DateTime<Utc>) -> f64 {
    let age_days = (now - listing.created_at).num_milliseconds() as f64 / MILLIS_PER_DAY;
    age_days + listing.price / 100.0
}

fn matches_search(listing: &Listing, query: &str) -> bool {
    let fields = [
        Some(listing.title.as_str()),
        Some(listing.description.as_str()),
        listing.brand.as_deref(),
        listing.category.as_ref().map(|category| category.label()),
        listing.color.as_deref(),
        listing.size.as_deref(),
        listing.condition.as_deref(),
        listing.gender.map(|gender| gender.label()),
        listing.seller_name.as_deref(),
    ];
    fields
        .into_iter()
        .any(|field| contains_lower(field, query))
}

fn contains_lower(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(needle))
}

// `sort_by` is stable, so equal keys keep their input order.
fn sort_listings(listings: &mut [&Listing], sort_by: SortBy, now: DateTime<Utc>) {
    match sort_by {
        SortBy::Newest => listings.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::Oldest => listings.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortBy::PriceLow => listings.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortBy::PriceHigh => listings.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortBy::Alphabetical => listings.sort_by(|a, b| a.title.cmp(&b.title)),
        SortBy::Category => listings.sort_by(|a, b| {
            a.sort_label()
                .cmp(b.sort_label())
                .then_with(|| a.title.cmp(&b.title))
        }),
        SortBy::Popular => listings.sort_by(|a, b| {
            popularity_score(a, now)
                .partial_cmp(&popularity_score(b, now))
                .unwrap_or(Ordering::Equal)
        }),
    }
}
