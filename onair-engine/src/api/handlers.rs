//! HTTP request handlers

use crate::api::server::AppContext;
use crate::director::StationSummary;
use crate::error::Error;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct StationListResponse {
    active_station: String,
    stations: Vec<StationSummary>,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn api_error(err: Error) -> ApiError {
    let code = match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(StatusResponse {
            status: err.to_string(),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "onair-engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Station Endpoints
// ============================================================================

/// GET /stations
pub async fn list_stations(State(ctx): State<AppContext>) -> Json<StationListResponse> {
    Json(StationListResponse {
        active_station: ctx.director.active_station().await,
        stations: ctx.director.stations().await,
    })
}

/// GET /stations/active
pub async fn get_active_station(
    State(ctx): State<AppContext>,
) -> Result<Json<StationSummary>, ApiError> {
    let active = ctx.director.active_station().await;
    ctx.director.station(&active).await.map(Json).map_err(api_error)
}

/// GET /stations/:station_id
pub async fn get_station(
    State(ctx): State<AppContext>,
    Path(station_id): Path<String>,
) -> Result<Json<StationSummary>, ApiError> {
    ctx.director.station(&station_id).await.map(Json).map_err(api_error)
}

/// POST /stations/:station_id/activate
pub async fn activate_station(
    State(ctx): State<AppContext>,
    Path(station_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    match ctx.director.set_active_station(&station_id).await {
        Ok(()) => {
            info!("Activated station '{}' via API", station_id);
            Ok(Json(StatusResponse {
                status: "ok".to_string(),
            }))
        }
        Err(e) => {
            warn!("Activate station '{}' failed: {}", station_id, e);
            Err(api_error(e))
        }
    }
}
