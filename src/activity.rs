use crate::catalog::Listing;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ListingPosted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub listing_id: String,
    pub title: String,
    pub category: String,
    pub price: f64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityDigest {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total_in_window: usize,
    pub events: Vec<ActivityEvent>,
    pub by_category: Vec<CategoryCount>,
}

/// Summarises listings posted within `[now - window, now]`, newest first.
/// Listings stamped after `now` are ignored.
pub fn recent_activity(
    listings: &[Listing],
    now: DateTime<Utc>,
    window: Duration,
    limit: usize,
) -> ActivityDigest {
    let window_start = now - window;
    let mut recent: Vec<&Listing> = listings
        .iter()
        .filter(|listing| listing.created_at >= window_start && listing.created_at <= now)
        .collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for listing in &recent {
        *counts.entry(listing.group_label()).or_default() += 1;
    }
    let mut by_category: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    by_category.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });

    let events = recent
        .iter()
        .take(limit)
        .map(|listing| ActivityEvent {
            kind: ActivityKind::ListingPosted,
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            category: listing.group_label().to_string(),
            price: listing.price,
            at: listing.created_at,
        })
        .collect();

    ActivityDigest {
        window_start,
        window_end: now,
        total_in_window: recent.len(),
        events,
        by_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 10, 18, 0, 0)
            .single()
            .expect("valid date")
    }

    fn posted(id: &str, hours_ago: i64, category: Option<Category>) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Listing {id}"),
            description: String::new(),
            category,
            gender: None,
            size: None,
            brand: None,
            color: None,
            condition: None,
            price: 20.0,
            created_at: now() - Duration::hours(hours_ago),
            seller_name: None,
        }
    }

    #[test]
    fn window_bounds_and_ordering() {
        let data = vec![
            posted("stale", 30, Some(Category::Hiking)),
            posted("a", 5, Some(Category::Hiking)),
            posted("future", -2, Some(Category::Hiking)),
            posted("b", 1, None),
            posted("edge", 24, Some(Category::Skiing)),
        ];
        let digest = recent_activity(&data, now(), Duration::hours(24), 10);
        let ids: Vec<&str> = digest.events.iter().map(|e| e.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "edge"]);
        assert_eq!(digest.total_in_window, 3);
        assert_eq!(digest.events[0].category, "Uncategorized");
    }

    #[test]
    fn limit_caps_events_but_not_counts() {
        let data: Vec<Listing> = (0..5)
            .map(|n| posted(&n.to_string(), n, Some(Category::Camping)))
            .collect();
        let digest = recent_activity(&data, now(), Duration::hours(24), 2);
        assert_eq!(digest.events.len(), 2);
        assert_eq!(digest.total_in_window, 5);
        assert_eq!(
            digest.by_category,
            vec![CategoryCount {
                category: "Camping".into(),
                count: 5
            }]
        );
    }

    #[test]
    fn empty_catalog_yields_empty_digest() {
        let digest = recent_activity(&[], now(), Duration::hours(24), 20);
        assert!(digest.events.is_empty());
        assert!(digest.by_category.is_empty());
        assert_eq!(digest.window_end, now());
    }
}
