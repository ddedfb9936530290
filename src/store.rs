use crate::cache;
use crate::catalog::Listing;
use crate::catalog::ingest::{RawCatalog, RawListing, RejectedListing, ingest_batch};
use crate::supabase::{SupabaseClient, SupabaseError};
use chrono::Utc;
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

const DEMO_SEED: &str = include_str!("../data/seed_catalog.yaml");

#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// Seed document on disk, or the embedded demo catalog when no path is set.
    Seed { path: Option<PathBuf> },
    Supabase(SupabaseClient),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read seed file {path}: {message}")]
    Io { path: String, message: String },
    #[error("cannot parse catalog document: {0}")]
    Parse(String),
    #[error("supabase: {0}")]
    Supabase(#[from] SupabaseError),
}

impl CatalogSource {
    /// Supabase when credentials are configured, the seed catalog otherwise.
    pub fn from_env(seed_path: Option<PathBuf>) -> Self {
        match SupabaseClient::from_env() {
            Some(client) => CatalogSource::Supabase(client),
            None => CatalogSource::Seed { path: seed_path },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CatalogSource::Seed { path: Some(_) } => "seed_file",
            CatalogSource::Seed { path: None } => "demo_seed",
            CatalogSource::Supabase(_) => "supabase",
        }
    }

    pub async fn fetch(&self) -> Result<Vec<RawListing>, SourceError> {
        match self {
            CatalogSource::Seed { path: None } => Ok(parse_seed(DEMO_SEED, false)?.listings),
            CatalogSource::Seed { path: Some(path) } => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|err| SourceError::Io {
                        path: path.display().to_string(),
                        message: err.to_string(),
                    })?;
                let is_json = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                Ok(parse_seed(&text, is_json)?.listings)
            }
            CatalogSource::Supabase(client) => Ok(client.fetch_listings().await?),
        }
    }
}

pub fn parse_seed(text: &str, is_json: bool) -> Result<RawCatalog, SourceError> {
    if is_json {
        serde_json::from_str(text).map_err(|err| SourceError::Parse(err.to_string()))
    } else {
        serde_yaml::from_str(text).map_err(|err| SourceError::Parse(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshSummary {
    pub source: &'static str,
    pub loaded: usize,
    pub rejected: Vec<RejectedListing>,
    pub from_cache: bool,
}

/// Holds the current catalog as an immutable snapshot. Readers clone the
/// `Arc` and never see a half-applied refresh.
#[derive(Clone)]
pub struct CatalogStore {
    snapshot: Arc<RwLock<Arc<Vec<Listing>>>>,
    source: Arc<CatalogSource>,
    cache: Option<redis::Client>,
    cache_ttl_secs: u64,
}

impl CatalogStore {
    pub fn new(source: CatalogSource, cache: Option<redis::Client>, cache_ttl_secs: u64) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            source: Arc::new(source),
            cache,
            cache_ttl_secs,
        }
    }

    pub fn demo() -> Self {
        Self::new(CatalogSource::Seed { path: None }, None, 900)
    }

    pub async fn snapshot(&self) -> Arc<Vec<Listing>> {
        self.snapshot.read().await.clone()
    }

    pub async fn replace(&self, listings: Vec<Listing>) {
        *self.snapshot.write().await = Arc::new(listings);
    }

    pub async fn refresh(&self) -> Result<RefreshSummary, SourceError> {
        let (raws, from_cache) = match self.source.fetch().await {
            Ok(raws) => {
                if let Some(client) = &self.cache {
                    let catalog = RawCatalog {
                        listings: raws.clone(),
                    };
                    if let Err(err) =
                        cache::store_snapshot(client, &catalog, self.cache_ttl_secs).await
                    {
                        warn!(target = "trailhead.store", error = %err, "catalog_cache_write_failed");
                    }
                }
                (raws, false)
            }
            Err(err) => {
                let cached = match &self.cache {
                    Some(client) => cache::load_snapshot(client).await.unwrap_or_else(|cache_err| {
                        warn!(target = "trailhead.store", error = %cache_err, "catalog_cache_read_failed");
                        None
                    }),
                    None => None,
                };
                let Some(catalog) = cached else {
                    return Err(err);
                };
                warn!(target = "trailhead.store", source = self.source.name(), error = %err, "catalog_source_failed_using_cache");
                (catalog.listings, true)
            }
        };

        let report = ingest_batch(raws, Utc::now());
        let summary = RefreshSummary {
            source: self.source.name(),
            loaded: report.listings.len(),
            rejected: report.rejected,
            from_cache,
        };
        self.replace(report.listings).await;
        info!(
            target = "trailhead.store",
            source = summary.source,
            loaded = summary.loaded,
            rejected = summary.rejected.len(),
            from_cache = summary.from_cache,
            "catalog_refreshed"
        );
        crate::metrics::catalog_refreshed(summary.source, summary.loaded, summary.rejected.len());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_seed_parses() {
        let catalog = parse_seed(DEMO_SEED, false).expect("demo seed");
        assert!(catalog.listings.len() >= 10);
    }

    #[test]
    fn json_seed_parses() {
        let catalog = parse_seed(r#"{"listings":[{"id":"x","price":3}]}"#, true).expect("json");
        assert_eq!(catalog.listings.len(), 1);
        assert!(parse_seed("listings: [", false).is_err());
    }

    #[test]
    fn mistyped_field_rejects_only_its_own_row() {
        let catalog = parse_seed(
            r#"{"listings":[{"id":7,"price":"n/a"},{"id":"ok","price":4}]}"#,
            true,
        )
        .expect("json");
        assert_eq!(catalog.listings.len(), 2);
        let report = ingest_batch(catalog.listings, Utc::now());
        assert_eq!(report.listings.len(), 1);
        assert_eq!(report.listings[0].id, "ok");
        assert_eq!(report.rejected[0].id.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn demo_refresh_loads_and_reports_rejections() {
        let store = CatalogStore::demo();
        assert!(store.snapshot().await.is_empty());
        let summary = store.refresh().await.expect("refresh");
        assert_eq!(summary.source, "demo_seed");
        assert!(!summary.from_cache);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(store.snapshot().await.len(), summary.loaded);
    }

    #[tokio::test]
    async fn seed_file_source_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("trailhead-seed-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            r#"{"listings":[{"id":"one","title":"Tent","price":"120","category":"Camping"}]}"#,
        )
        .await
        .expect("write seed");
        let store = CatalogStore::new(CatalogSource::Seed { path: Some(path.clone()) }, None, 60);
        let summary = store.refresh().await.expect("refresh");
        assert_eq!(summary.source, "seed_file");
        assert_eq!(summary.loaded, 1);
        assert_eq!(store.snapshot().await[0].title, "Tent");
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_seed_file_is_an_error_and_keeps_snapshot() {
        let store = CatalogStore::new(
            CatalogSource::Seed {
                path: Some(PathBuf::from("/nonexistent/trailhead/catalog.yaml")),
            },
            None,
            60,
        );
        store.replace(Vec::new()).await;
        let err = store.refresh().await.expect_err("should fail");
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_cache_surfaces_the_source_error() {
        let cache = redis::Client::open("redis://127.0.0.1:1/").expect("redis url");
        let store = CatalogStore::new(
            CatalogSource::Seed {
                path: Some(PathBuf::from("/nonexistent/trailhead/catalog.yaml")),
            },
            Some(cache),
            60,
        );
        let err = store.refresh().await.expect_err("should fail");
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn snapshots_are_isolated_from_later_refreshes() {
        let store = CatalogStore::demo();
        let before = store.snapshot().await;
        store.refresh().await.expect("refresh");
        assert!(before.is_empty());
        assert!(!store.snapshot().await.is_empty());
    }
}
