//! HTTP API handlers and routes using axum.
//!
//! Read-only, unauthenticated. Every payload uses the platform envelope:
//! `{success: true, data: …}` on success, `{success: false, message: …}` on
//! failure.
//!
//! Routes:
//! - GET /health - Health check
//! - GET /disasters - All cached hazards, filtered
//! - GET /disasters/nws - Weather alerts only
//! - GET /disasters/earthquakes - Seismic events only
//! - GET /disasters/wildfires - Wildfire alerts only

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use hazard_feeds::FeedSource;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::query::{run_query, DisasterData, DisasterParams, HazardFilter};
use crate::refresh::RefreshCoordinator;
use crate::store::HazardStore;

/// Application state shared across handlers.
pub struct AppState<S, W, Q> {
    pub coordinator: RefreshCoordinator<S, W, Q>,
}

/// Create the API router.
pub fn create_router<S, W, Q>(state: AppState<S, W, Q>) -> Router
where
    S: HazardStore,
    W: FeedSource + 'static,
    Q: FeedSource + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/disasters", get(list_disasters_handler::<S, W, Q>))
        .route("/disasters/nws", get(nws_handler::<S, W, Q>))
        .route("/disasters/earthquakes", get(earthquakes_handler::<S, W, Q>))
        .route("/disasters/wildfires", get(wildfires_handler::<S, W, Q>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ============================================================================
// Forced Filters
// ============================================================================

/// `/disasters/nws`: weather alerts only, whatever the caller passed.
fn force_nws(params: &mut DisasterParams) {
    params.source = Some("nws".to_string());
}

/// `/disasters/earthquakes`: seismic source and earthquake type both pinned;
/// caller-supplied values for those keys are ignored.
fn force_earthquakes(params: &mut DisasterParams) {
    params.source = Some("usgs".to_string());
    params.hazard_type = Some("earthquake".to_string());
}

/// `/disasters/wildfires`: wildfire type pinned.
fn force_wildfires(params: &mut DisasterParams) {
    params.hazard_type = Some("wildfire".to_string());
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// All cached hazards with ad-hoc filters.
/// GET /disasters
async fn list_disasters_handler<S, W, Q>(
    State(state): State<Arc<AppState<S, W, Q>>>,
    Query(params): Query<DisasterParams>,
) -> Result<Json<ApiResponse<DisasterData>>, ApiError>
where
    S: HazardStore,
    W: FeedSource,
    Q: FeedSource,
{
    respond(&state, params).await
}

/// Weather alerts only.
/// GET /disasters/nws
async fn nws_handler<S, W, Q>(
    State(state): State<Arc<AppState<S, W, Q>>>,
    Query(mut params): Query<DisasterParams>,
) -> Result<Json<ApiResponse<DisasterData>>, ApiError>
where
    S: HazardStore,
    W: FeedSource,
    Q: FeedSource,
{
    force_nws(&mut params);
    respond(&state, params).await
}

/// Seismic events only.
/// GET /disasters/earthquakes
async fn earthquakes_handler<S, W, Q>(
    State(state): State<Arc<AppState<S, W, Q>>>,
    Query(mut params): Query<DisasterParams>,
) -> Result<Json<ApiResponse<DisasterData>>, ApiError>
where
    S: HazardStore,
    W: FeedSource,
    Q: FeedSource,
{
    force_earthquakes(&mut params);
    respond(&state, params).await
}

/// Wildfire alerts only.
/// GET /disasters/wildfires
async fn wildfires_handler<S, W, Q>(
    State(state): State<Arc<AppState<S, W, Q>>>,
    Query(mut params): Query<DisasterParams>,
) -> Result<Json<ApiResponse<DisasterData>>, ApiError>
where
    S: HazardStore,
    W: FeedSource,
    Q: FeedSource,
{
    force_wildfires(&mut params);
    respond(&state, params).await
}

/// Shared query path: validate filters, ensure freshness, query the snapshot.
async fn respond<S, W, Q>(
    state: &AppState<S, W, Q>,
    params: DisasterParams,
) -> Result<Json<ApiResponse<DisasterData>>, ApiError>
where
    S: HazardStore,
    W: FeedSource,
    Q: FeedSource,
{
    let filter = HazardFilter::from_params(params).map_err(ApiError::bad_request)?;

    state.coordinator.ensure_fresh().await.map_err(|e| {
        error!("Cache refresh failed: {:?}", e);
        ApiError::internal(e)
    })?;

    let records = state.coordinator.store().snapshot().await.map_err(|e| {
        error!("Snapshot read failed: {:?}", e);
        ApiError::internal(e)
    })?;

    let data = run_query(records, &filter, Utc::now());
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// Envelopes & Error Handling
// ============================================================================

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// API error types, rendered as the failure envelope.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    fn bad_request(e: impl fmt::Display) -> Self {
        ApiError::BadRequest(e.to_string())
    }

    fn internal(e: impl fmt::Display) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

// ============================================================================
// Tests
// ============================================================================
