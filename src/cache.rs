use crate::catalog::ingest::RawCatalog;
use redis::AsyncCommands;
use thiserror::Error;

const SNAPSHOT_KEY: &str = "trailhead:catalog:snapshot";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("snapshot encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Last raw catalog written by a successful refresh, if Redis still holds one.
pub async fn load_snapshot(client: &redis::Client) -> Result<Option<RawCatalog>, CacheError> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    let stored: Option<String> = conn.get(SNAPSHOT_KEY).await?;
    stored
        .map(|body| serde_json::from_str(&body))
        .transpose()
        .map_err(CacheError::from)
}

pub async fn store_snapshot(
    client: &redis::Client,
    catalog: &RawCatalog,
    ttl_secs: u64,
) -> Result<(), CacheError> {
    let body = serde_json::to_string(catalog)?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    conn.set_ex::<_, _, ()>(SNAPSHOT_KEY, body, ttl_secs).await?;
    Ok(())
}
