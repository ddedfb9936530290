mod activity;
mod cache;
mod catalog;
mod config;
mod metrics;
mod models;
mod security;
mod store;
mod supabase;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use catalog::{FilterParseError, compute_grouped_listings, compute_visible_listings};
use config::{SERVICE_NAME, ServiceConfig};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::{ActivityQuery, ApiError, GroupedResponse, ListingsQuery, ListingsResponse};
use security::{AdminContext, AdminKeys, require_admin};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc, time::Instant};
use store::{CatalogSource, CatalogStore, SourceError};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const MAX_ACTIVITY_LIMIT: usize = 100;
const MAX_ACTIVITY_WINDOW_HOURS: i64 = 24 * 365;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "trailhead.api", "server crashed: {err}");
    }
}

async fn run() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServiceConfig::from_env();
    let redis = config
        .redis_url
        .as_deref()
        .and_then(|url| redis::Client::open(url).ok());
    let source = CatalogSource::from_env(config.seed_path.clone());
    info!(target = "trailhead.api", source = source.name(), "catalog source selected");
    let store = CatalogStore::new(source, redis, config.cache_ttl_secs);
    if let Err(err) = store.refresh().await {
        warn!(target = "trailhead.api", error = %err, "initial catalog load failed; starting empty");
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| eyre::eyre!("prometheus recorder: {err}"))?;
    let port = config.port;
    let state = AppState {
        store,
        prometheus,
        config: Arc::new(config),
    };
    let app = build_router(state, AdminKeys::from_env());

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "trailhead.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    store: CatalogStore,
    prometheus: PrometheusHandle,
    config: Arc<ServiceConfig>,
}

fn build_router(state: AppState, admin_keys: AdminKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let protected = Router::new()
        .route("/catalog/refresh", post(refresh_catalog))
        .route_layer(middleware::from_fn_with_state(admin_keys, require_admin));

    let body_limit = state.config.body_limit;
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/listings", get(list_listings))
        .route("/listings/grouped", get(list_grouped))
        .route("/listings/{id}", get(get_listing))
        .route("/facets", get(catalog_facets))
        .route("/activity", get(activity_feed))
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
///
/// Reports the number of listings in the current snapshot.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let listings = state.store.snapshot().await.len();
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "listings": listings,
    }))
}

async fn metrics_endpoint(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(secret) = &state.config.metrics_key {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus.render(),
    )
        .into_response()
}

/// Filtered and sorted storefront listings.
///
/// - Method: `GET`
/// - Path: `/listings`
/// - Query: `q`, `category`, `gender`, `size`, `brand`, `color`, `price`, `sort`
async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> Result<Response, AppError> {
    crate::metrics::inc_requests("/listings");
    let filters = query.to_filter_state()?;
    let snapshot = state.store.snapshot().await;
    let started = Instant::now();
    let visible = compute_visible_listings(&snapshot, &filters);
    crate::metrics::view_computed("/listings", started.elapsed().as_micros(), visible.len());
    Ok(Json(ListingsResponse {
        count: visible.len(),
        sort: filters.sort_by.as_param(),
        listings: visible,
    })
    .into_response())
}

/// Listings grouped into category sections.
///
/// - Method: `GET`
/// - Path: `/listings/grouped`
/// - Query: as `/listings`, plus `section` to show a single category
async fn list_grouped(
    State(state): State<AppState>,
    Query(query): Query<ListingsQuery>,
) -> Result<Response, AppError> {
    crate::metrics::inc_requests("/listings/grouped");
    let filters = query.to_filter_state()?;
    let snapshot = state.store.snapshot().await;
    let started = Instant::now();
    let groups = compute_grouped_listings(&snapshot, &filters);
    let visible = groups.iter().map(|group| group.len()).sum();
    crate::metrics::view_computed("/listings/grouped", started.elapsed().as_micros(), visible);
    Ok(Json(GroupedResponse {
        sort: filters.sort_by.as_param(),
        groups: groups.into_iter().map(Into::into).collect(),
    })
    .into_response())
}

async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let snapshot = state.store.snapshot().await;
    let listing = snapshot
        .iter()
        .find(|listing| listing.id == id)
        .ok_or_else(|| AppError::NotFound(id.clone()))?;
    Ok(Json(listing).into_response())
}

async fn catalog_facets(State(state): State<AppState>) -> Json<catalog::facets::CatalogFacets> {
    crate::metrics::inc_requests("/facets");
    let snapshot = state.store.snapshot().await;
    Json(catalog::facets::collect_facets(&snapshot))
}

/// Recently posted listings within a bounded window.
///
/// - Method: `GET`
/// - Path: `/activity`
/// - Query: `window_hours` (default from `ACTIVITY_WINDOW_HOURS`), `limit` (max 100)
async fn activity_feed(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Json<activity::ActivityDigest> {
    crate::metrics::inc_requests("/activity");
    let hours = query
        .window_hours
        .filter(|h| *h > 0)
        .unwrap_or(state.config.activity_window_hours)
        .min(MAX_ACTIVITY_WINDOW_HOURS);
    let limit = query.limit.unwrap_or(20).min(MAX_ACTIVITY_LIMIT);
    let snapshot = state.store.snapshot().await;
    Json(activity::recent_activity(
        &snapshot,
        chrono::Utc::now(),
        chrono::Duration::hours(hours),
        limit,
    ))
}

/// Reload the catalog from its configured source.
///
/// - Method: `POST`
/// - Path: `/catalog/refresh`
/// - Auth: `Authorization: Bearer <key>` or `X-Trailhead-Key: <key>`
async fn refresh_catalog(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
) -> Result<Json<store::RefreshSummary>, AppError> {
    crate::metrics::inc_requests("/catalog/refresh");
    info!(target = "trailhead.api", operator = %admin.operator, "catalog refresh requested");
    let summary = state.store.refresh().await?;
    Ok(Json(summary))
}

#[derive(Debug)]
enum AppError {
    InvalidFilter(FilterParseError),
    NotFound(String),
    Source(SourceError),
}

impl From<FilterParseError> for AppError {
    fn from(value: FilterParseError) -> Self {
        Self::InvalidFilter(value)
    }
}

impl From<SourceError> for AppError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            AppError::InvalidFilter(err) => {
                (StatusCode::BAD_REQUEST, "invalid_filter", err.to_string())
            }
            AppError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("listing `{id}` does not exist"),
            ),
            AppError::Source(err) => {
                error!(target = "trailhead.api", error = %err, "catalog source unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "source_unavailable",
                    err.to_string(),
                )
            }
        };
        let payload = ApiError {
            error: code.to_string(),
            detail: Some(detail),
        };
        (status, Json(payload)).into_response()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
