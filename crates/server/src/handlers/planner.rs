//! # Planner Handlers
//!
//! `POST /api/recommend` and `POST /api/route`. Both delegate to the library
//! and only resolve the task prompt, its provider and the caller's identity.

use super::{ApiJson, AppError, AppState};
use crate::{
    config::{ROUTE_PLANNING_TASK, SPOT_RECOMMENDATION_TASK},
    identity::CurrentUser,
};
use axum::extract::State;
use drivespot::{
    recommend::recommend,
    route::{plan_route, route_rng},
    RecommendRequest, RecommendResponse, RouteRequest, RouteResponse,
};
use tracing::info;

fn check_origin(lat: f64, lng: f64) -> Result<(), AppError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::BadRequest(format!("invalid lat: {lat}")));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::BadRequest(format!("invalid lng: {lng}")));
    }
    Ok(())
}

/// `POST /api/recommend`
pub async fn recommend_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<RecommendRequest>,
) -> Result<ApiJson<RecommendResponse>, AppError> {
    check_origin(payload.lat, payload.lng)?;
    info!(user_id = %user_id, lat = payload.lat, lng = payload.lng, "Received recommendation request.");

    let (prompt, ai_provider) = app_state.task(SPOT_RECOMMENDATION_TASK)?;
    let response = recommend(
        &app_state.sqlite_provider,
        ai_provider,
        prompt,
        &app_state.config.recommendation,
        &user_id,
        &payload,
    )
    .await?;

    info!(user_id = %user_id, count = response.spots.len(), "Returning recommendations.");
    Ok(ApiJson(response))
}

/// `POST /api/route`
pub async fn route_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<RouteRequest>,
) -> Result<ApiJson<RouteResponse>, AppError> {
    check_origin(payload.lat, payload.lng)?;
    info!(
        user_id = %user_id,
        departure_time = %payload.departure(),
        return_time = ?payload.return_time,
        "Received route request."
    );

    let (prompt, ai_provider) = app_state.task(ROUTE_PLANNING_TASK)?;
    let settings = &app_state.config.route;
    let mut rng = route_rng(settings.random_seed);
    let response = plan_route(
        &app_state.sqlite_provider,
        ai_provider,
        prompt,
        settings,
        &user_id,
        &payload,
        &mut rng,
    )
    .await?;

    info!(user_id = %user_id, stops = response.stops.len(), total_distance_km = response.total_distance_km, "Returning route.");
    Ok(ApiJson(response))
}
