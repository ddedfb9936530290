pub mod facets;
pub mod filters;
pub mod ingest;
pub mod listing;
pub mod view;

pub use filters::{FilterParseError, FilterState, PriceRange, SortBy};
pub use listing::{Category, Gender, Listing};
pub use view::{CategoryGroup, compute_grouped_listings, compute_visible_listings};
