//! HTTP route handlers.
//!
//! Each data route is a thin proxy over [`CachedNexTrip`](crate::cache::CachedNexTrip):
//! parse the path, pass `cache_bust` through, return the upstream body as is.

use axum::{Json, Router, extract::State, routing::get};
use tower_http::trace::TraceLayer;

use crate::nextrip::{Endpoint, RawJson};

use super::dto::*;
use super::error::AppError;
use super::extract::{ApiPath, ApiQuery};
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/demo", get(demo))
        .route("/providers", get(providers))
        .route("/routes", get(routes))
        .route("/directions/:route", get(directions))
        .route("/stops/:route/:direction", get(stops))
        .route("/departures/:stop_id", get(departures))
        .route(
            "/timepoint_departures/:route/:direction/:stop",
            get(timepoint_departures),
        )
        .route("/vehicle_locations/:route", get(vehicle_locations))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Minutes until the next departure, looked up by names.
async fn demo(
    State(state): State<AppState>,
    ApiQuery(req): ApiQuery<DemoRequest>,
) -> Result<Json<DemoResponse>, AppError> {
    let route = required(req.route, "route")?;
    let stop = required(req.stop, "stop")?;
    let direction = required(req.direction, "direction")?;

    let minutes = state
        .nextrip
        .demo(&route, &stop, &direction, req.cache_bust.is_some())
        .await?;

    Ok(Json(DemoResponse { minutes }))
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::BadRequest {
        message: format!("Missing parameter '{name}'"),
    })
}

async fn providers(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CacheParams>,
) -> Result<RawJson, AppError> {
    Ok(state
        .nextrip
        .raw(Endpoint::Providers, params.cache_bust())
        .await?)
}

async fn routes(
    State(state): State<AppState>,
    ApiQuery(req): ApiQuery<RoutesRequest>,
) -> Result<RawJson, AppError> {
    Ok(state
        .nextrip
        .routes_raw(req.provider.as_deref(), req.cache_bust.is_some())
        .await?)
}

async fn directions(
    State(state): State<AppState>,
    ApiPath(route): ApiPath<u32>,
    ApiQuery(params): ApiQuery<CacheParams>,
) -> Result<RawJson, AppError> {
    Ok(state
        .nextrip
        .raw(Endpoint::Directions { route }, params.cache_bust())
        .await?)
}

async fn stops(
    State(state): State<AppState>,
    ApiPath((route, direction)): ApiPath<(u32, u32)>,
    ApiQuery(params): ApiQuery<CacheParams>,
) -> Result<RawJson, AppError> {
    Ok(state
        .nextrip
        .raw(Endpoint::Stops { route, direction }, params.cache_bust())
        .await?)
}

async fn departures(
    State(state): State<AppState>,
    ApiPath(stop_id): ApiPath<u32>,
    ApiQuery(params): ApiQuery<CacheParams>,
) -> Result<RawJson, AppError> {
    Ok(state
        .nextrip
        .raw(Endpoint::Departures { stop_id }, params.cache_bust())
        .await?)
}

async fn timepoint_departures(
    State(state): State<AppState>,
    ApiPath((route, direction, stop)): ApiPath<(u32, u32, String)>,
    ApiQuery(params): ApiQuery<CacheParams>,
) -> Result<RawJson, AppError> {
    let endpoint = Endpoint::timepoint_departures(route, direction, &stop)?;
    Ok(state.nextrip.raw(endpoint, params.cache_bust()).await?)
}

async fn vehicle_locations(
    State(state): State<AppState>,
    ApiPath(route): ApiPath<u32>,
    ApiQuery(params): ApiQuery<CacheParams>,
) -> Result<RawJson, AppError> {
    Ok(state
        .nextrip
        .raw(Endpoint::VehicleLocations { route }, params.cache_bust())
        .await?)
}
