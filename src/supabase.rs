use crate::catalog::ingest::RawListing;
use crate::config::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_TIMEOUT_SECS, LISTINGS_TABLE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    service_key: String,
    table: String,
    http: Client,
}

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Deserialize(String),
}

impl SupabaseClient {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SUPABASE_URL").ok()?;
        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|_| std::env::var("SUPABASE_SERVICE_KEY"))
            .or_else(|_| std::env::var("SUPABASE_KEY"))
            .ok()?;
        Some(Self::new(&base_url, service_key, LISTINGS_TABLE.as_str()))
    }

    pub fn new(base_url: &str, service_key: String, table: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            table: table.to_string(),
            http: build_client(),
        }
    }

    pub fn listings_url(&self) -> String {
        format!(
            "{}/rest/v1/{}?select=*",
            self.base_url,
            urlencoding::encode(&self.table)
        )
    }

    /// Reads every row of the listings table as loosely typed documents.
    pub async fn fetch_listings(&self) -> Result<Vec<RawListing>, SupabaseError> {
        let response = self
            .http
            .get(self.listings_url())
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .send()
            .await
            .map_err(|err| SupabaseError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SupabaseError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json::<Vec<RawListing>>()
            .await
            .map_err(|err| SupabaseError::Deserialize(err.to_string()))
    }
}

fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(*HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(*HTTP_CONNECT_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| Client::new())
}
