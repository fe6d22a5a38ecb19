//! HTTP API.
//!
//! Exposes the loaded catalogs as JSON. Packages and charts are augmented
//! with the `onyxia` configuration block on their way out.
//!
//! # Endpoints
//!
//! Every catalog route is mounted under both `/public/catalogs` and
//! `/public/catalog`.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/public/catalogs` | Catalogs enabled for the caller's region (no bodies) |
//! | `GET` | `/public/catalogs/{catalogId}` | Full catalog: entries and packages |
//! | `GET` | `/public/catalogs/{catalogId}/{packageName}` | One augmented package |
//! | `GET` | `/public/catalogs/{catalogId}/charts/{chartName}` | All versions of a chart, augmented |
//! | `GET` | `/public/catalogs/{catalogId}/charts/{chartName}/versions/{version}` | One chart version, augmented |
//! | `GET` | `/health` | Health check (returns version) |
//!
//! # Regions
//!
//! The `ONYXIA-REGION` request header selects a configured region by id.
//! Without it the first configured region applies; with no regions
//! configured, every catalog is listed.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "catalog not found: ds" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::{CatalogDetail, CatalogSummary};
use crate::config::Config;
use crate::error::NotFound;
use crate::models::{Chart, Package};
use crate::region::{is_enabled, Region};
use crate::schema::{augment, augment_chart};
use crate::service::CatalogService;

/// Header naming the caller's region.
pub const REGION_HEADER: &str = "ONYXIA-REGION";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CatalogService>,
    pub regions: Arc<Vec<Region>>,
}

impl AppState {
    pub fn new(service: Arc<CatalogService>, regions: Vec<Region>) -> Self {
        Self {
            service,
            regions: Arc::new(regions),
        }
    }

    /// Region for a request: the one named by the header, else the first
    /// configured one.
    fn region(&self, headers: &HeaderMap) -> Result<Option<&Region>, AppError> {
        match headers.get(REGION_HEADER) {
            Some(value) => {
                let id = value
                    .to_str()
                    .map_err(|_| bad_request("region header is not valid UTF-8"))?;
                self.regions
                    .iter()
                    .find(|r| r.id == id)
                    .map(Some)
                    .ok_or_else(|| bad_request(format!("unknown region: {}", id)))
            }
            None => Ok(self.regions.first()),
        }
    }
}

/// Builds the router for `state`. Used by [`run_server`] and by tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalogs = Router::new()
        .route("/{catalog_id}", get(handle_get_catalog))
        .route("/{catalog_id}/{package_name}", get(handle_get_package))
        .route("/{catalog_id}/charts/{chart_name}", get(handle_get_charts))
        .route(
            "/{catalog_id}/charts/{chart_name}/versions/{version}",
            get(handle_get_chart_version),
        );

    Router::new()
        .route("/health", get(handle_health))
        .route("/public/catalogs", get(handle_list_catalogs))
        .route("/public/catalog", get(handle_list_catalogs))
        .nest("/public/catalogs", catalogs.clone())
        .nest("/public/catalog", catalogs)
        .layer(cors)
        .with_state(state)
}

/// Loads every catalog and serves the API on `[server].bind`.
///
/// Runs until the process is terminated. When
/// `server.refresh_interval_secs` is set, all catalogs are reloaded on that
/// period in the background.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = Arc::new(CatalogService::from_config(config));

    let loading = service.clone();
    tokio::task::spawn_blocking(move || loading.load_all()).await?;

    let refresh = config
        .server
        .refresh_interval_secs
        .map(|secs| spawn_refresh(service.clone(), Duration::from_secs(secs)));

    let result = serve(config, service.clone()).await;

    if let Some(handle) = refresh {
        handle.abort();
        let _ = handle.await;
    }
    // The service owns a blocking HTTP client, which must not be dropped
    // on an async worker.
    tokio::task::spawn_blocking(move || drop(service)).await?;

    result
}

async fn serve(config: &Config, service: Arc<CatalogService>) -> anyhow::Result<()> {
    let state = AppState::new(service, config.regions.clone());
    let app = router(state);

    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("catalog server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_refresh(service: Arc<CatalogService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick fires immediately; catalogs were just loaded.
        interval.tick().await;
        loop {
            interval.tick().await;
            let service = service.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || service.load_all()).await {
                tracing::error!("catalog refresh task failed: {}", e);
            }
        }
    })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<NotFound> for AppError {
    fn from(err: NotFound) -> Self {
        AppError {
            status: StatusCode::NOT_FOUND,
            code: "not_found".to_string(),
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /public/catalogs ============

#[derive(Serialize)]
struct CatalogListResponse {
    catalogs: Vec<CatalogSummary>,
}

async fn handle_list_catalogs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CatalogListResponse>, AppError> {
    let region = state.region(&headers)?;
    let catalogs = state
        .service
        .get_catalogs()
        .iter()
        .filter(|catalog| is_enabled(region, catalog))
        .map(|catalog| catalog.summary())
        .collect();
    Ok(Json(CatalogListResponse { catalogs }))
}

// ============ GET /public/catalogs/{catalogId} ============

async fn handle_get_catalog(
    State(state): State<AppState>,
    Path(catalog_id): Path<String>,
) -> Result<Json<CatalogDetail>, AppError> {
    let catalog = state.service.get_catalog_by_id(&catalog_id)?;
    Ok(Json(catalog.detail()))
}

// ============ GET /public/catalogs/{catalogId}/{packageName} ============

async fn handle_get_package(
    State(state): State<AppState>,
    Path((catalog_id, package_name)): Path<(String, String)>,
) -> Result<Json<Package>, AppError> {
    let mut package = state.service.get_package(&catalog_id, &package_name)?;
    augment(&mut package);
    Ok(Json(package))
}

// ============ GET /public/catalogs/{catalogId}/charts/{chartName} ============

async fn handle_get_charts(
    State(state): State<AppState>,
    Path((catalog_id, chart_name)): Path<(String, String)>,
) -> Result<Json<Vec<Chart>>, AppError> {
    let charts = state
        .service
        .get_charts(&catalog_id, &chart_name)?
        .into_iter()
        .map(|mut chart| {
            augment_chart(&mut chart);
            chart
        })
        .collect();
    Ok(Json(charts))
}

// ============ GET …/charts/{chartName}/versions/{version} ============

async fn handle_get_chart_version(
    State(state): State<AppState>,
    Path((catalog_id, chart_name, version)): Path<(String, String, String)>,
) -> Result<Json<Chart>, AppError> {
    let mut chart = state
        .service
        .get_chart_by_version(&catalog_id, &chart_name, &version)?;
    augment_chart(&mut chart);
    Ok(Json(chart))
}
