use crate::models::ApiError;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{self, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, env, sync::Arc};
use thiserror::Error;
use tracing::{info, warn};

pub const ADMIN_KEY_HEADER: &str = "X-Trailhead-Key";

/// Admin API keys keyed by secret, valued by the operator name they belong to.
#[derive(Clone, Default)]
pub struct AdminKeys {
    keys: Arc<HashMap<String, String>>,
}

#[derive(Clone, Debug)]
pub struct AdminContext {
    pub operator: String,
}

impl AdminKeys {
    pub fn from_env() -> Self {
        let raw = env::var("CATALOG_ADMIN_KEYS").unwrap_or_default();
        let keys = parse_keys(&raw);
        if keys.is_empty() {
            warn!(
                target = "trailhead.api",
                "CATALOG_ADMIN_KEYS is empty; catalog refresh is disabled"
            );
        } else {
            info!(target = "trailhead.api", key_count = keys.len(), "loaded admin keys from env");
        }
        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let keys = pairs
            .iter()
            .map(|(operator, key)| (key.to_string(), operator.to_string()))
            .collect();
        Self {
            keys: Arc::new(keys),
        }
    }

    fn authenticate(&self, presented: &str) -> Option<AdminContext> {
        self.keys.get(presented).map(|operator| AdminContext {
            operator: operator.clone(),
        })
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthError {
    #[error("Provide X-Trailhead-Key or Bearer token")]
    MissingKey,
    #[error("Key not recognized")]
    UnknownKey,
}

impl AdminAuthError {
    fn code(self) -> &'static str {
        match self {
            AdminAuthError::MissingKey => "missing_api_key",
            AdminAuthError::UnknownKey => "invalid_api_key",
        }
    }
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        warn!(target = "trailhead.api", reason = self.code(), "admin_request_rejected");
        let payload = ApiError {
            error: self.code().to_string(),
            detail: Some(self.to_string()),
        };
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

pub async fn require_admin(
    State(keys): State<AdminKeys>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AdminAuthError> {
    let presented = presented_key(request.headers()).ok_or(AdminAuthError::MissingKey)?;
    let context = keys
        .authenticate(&presented)
        .ok_or(AdminAuthError::UnknownKey)?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Bearer credentials win over the dedicated header; blank values count as absent.
fn presented_key(headers: &http::HeaderMap) -> Option<String> {
    let bearer = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| {
            let (scheme, token) = raw.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token)
        });
    bearer
        .or_else(|| {
            headers
                .get(ADMIN_KEY_HEADER)
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

fn parse_keys(raw: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    for token in raw.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.split_once(':') {
            Some((operator, key)) if !operator.trim().is_empty() && !key.trim().is_empty() => {
                entries.insert(key.trim().to_string(), operator.trim().to_string());
            }
            _ => warn!(
                target = "trailhead.api",
                "ignored malformed CATALOG_ADMIN_KEYS entry"
            ),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keys_skips_malformed_entries() {
        let keys = parse_keys("ops:secret-1, broken, :nokey, audit:secret-2");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.get("secret-1").map(String::as_str), Some("ops"));
        assert_eq!(keys.get("secret-2").map(String::as_str), Some("audit"));
    }

    #[test]
    fn bearer_and_header_keys_are_extracted() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(presented_key(&headers).as_deref(), Some("abc123"));

        let mut headers = http::HeaderMap::new();
        headers.insert(ADMIN_KEY_HEADER, http::HeaderValue::from_static(" k-9 "));
        assert_eq!(presented_key(&headers).as_deref(), Some("k-9"));
        assert_eq!(presented_key(&http::HeaderMap::new()), None);
    }

    #[test]
    fn non_bearer_authorization_falls_back_to_header() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );
        assert_eq!(presented_key(&headers), None);
        headers.insert(ADMIN_KEY_HEADER, http::HeaderValue::from_static("k-1"));
        assert_eq!(presented_key(&headers).as_deref(), Some("k-1"));
    }

    #[test]
    fn rejections_render_as_unauthorized_json() {
        let response = AdminAuthError::UnknownKey.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AdminAuthError::MissingKey.code(), "missing_api_key");
    }
}
