use once_cell::sync::Lazy;
use std::{env, path::PathBuf};

pub const SERVICE_NAME: &str = "trailhead-api-rs";

pub static LISTINGS_TABLE: Lazy<String> =
    Lazy::new(|| env::var("SUPABASE_LISTINGS_TABLE").unwrap_or_else(|_| "listings".to_string()));

pub static HTTP_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| env_parse("HTTP_TIMEOUT_SECS").unwrap_or(15));

pub static HTTP_CONNECT_TIMEOUT_SECS: Lazy<u64> =
    Lazy::new(|| env_parse("HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(5));

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub body_limit: usize,
    pub seed_path: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub activity_window_hours: i64,
    pub metrics_key: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT").unwrap_or(8000),
            body_limit: env_parse::<usize>("REQUEST_MAX_BYTES")
                .filter(|v| *v > 0)
                .unwrap_or(64 * 1024),
            seed_path: env_non_empty("CATALOG_SEED_PATH").map(PathBuf::from),
            redis_url: env_non_empty("REDIS_URL"),
            cache_ttl_secs: env_parse::<u64>("CATALOG_CACHE_TTL_SECS")
                .filter(|v| *v > 0)
                .unwrap_or(900),
            activity_window_hours: env_parse::<i64>("ACTIVITY_WINDOW_HOURS")
                .filter(|v| *v > 0)
                .unwrap_or(24),
            metrics_key: env_non_empty("METRICS_KEY"),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            body_limit: 64 * 1024,
            seed_path: None,
            redis_url: None,
            cache_ttl_secs: 900,
            activity_window_hours: 24,
            metrics_key: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
