//! # Spot Handlers
//!
//! CRUD over the spot catalogue, the nearest-spots lookup and the Overpass
//! bulk import. None of these are user-scoped.

use super::{ApiJson, ApiQuery, AppError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use drivespot::{
    ingest::BoundingBox,
    types::{NearbySpot, NewSpot, Spot},
    Category,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

const DEFAULT_NEARBY_LIMIT: u32 = 10;

#[derive(Deserialize, Debug, Default)]
pub struct SpotListQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Deserialize, Debug)]
pub struct ImportRequest {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    /// Categories to import. Empty means all of them.
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ImportResponse {
    pub imported: usize,
}

/// `GET /api/spots[?category=]`
pub async fn list_spots_handler(
    State(app_state): State<AppState>,
    ApiQuery(query): ApiQuery<SpotListQuery>,
) -> Result<ApiJson<Vec<Spot>>, AppError> {
    let spots = match query.category.as_deref() {
        None | Some("") => app_state.sqlite_provider.list_spots().await?,
        Some(raw) => {
            let category: Category = raw.parse()?;
            app_state
                .sqlite_provider
                .list_spots_by_category(category)
                .await?
        }
    };
    Ok(ApiJson(spots))
}

/// `POST /api/spots`
pub async fn create_spot_handler(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<NewSpot>,
) -> Result<(StatusCode, ApiJson<Spot>), AppError> {
    let spot = app_state.sqlite_provider.create_spot(payload).await?;
    info!(spot_id = spot.id, name = %spot.name, "Created spot.");
    Ok((StatusCode::CREATED, ApiJson(spot)))
}

/// `DELETE /api/spots`
pub async fn delete_all_spots_handler(
    State(app_state): State<AppState>,
) -> Result<ApiJson<Value>, AppError> {
    let deleted = app_state.sqlite_provider.delete_all_spots().await?;
    info!(deleted, "Deleted all spots.");
    Ok(ApiJson(json!({ "deleted": deleted })))
}

/// `DELETE /api/spots/{id}`
pub async fn delete_spot_handler(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiJson<Value>, AppError> {
    if !app_state.sqlite_provider.delete_spot(id).await? {
        return Err(AppError::NotFound(format!("spot {id} not found")));
    }
    info!(spot_id = id, "Deleted spot.");
    Ok(ApiJson(json!({ "status": "ok" })))
}

/// `GET /api/spots/nearby?lat&lng[&limit]`
pub async fn nearby_spots_handler(
    State(app_state): State<AppState>,
    ApiQuery(query): ApiQuery<NearbyQuery>,
) -> Result<ApiJson<Vec<NearbySpot>>, AppError> {
    if !query.lat.is_finite() || !(-90.0..=90.0).contains(&query.lat) {
        return Err(AppError::BadRequest(format!("invalid lat: {}", query.lat)));
    }
    if !query.lng.is_finite() || !(-180.0..=180.0).contains(&query.lng) {
        return Err(AppError::BadRequest(format!("invalid lng: {}", query.lng)));
    }
    let limit = query.limit.unwrap_or(DEFAULT_NEARBY_LIMIT);
    let spots = app_state
        .sqlite_provider
        .nearby_spots(query.lat, query.lng, limit)
        .await?;
    Ok(ApiJson(spots))
}

/// `POST /api/spots/import`
pub async fn import_spots_handler(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<ImportRequest>,
) -> Result<ApiJson<ImportResponse>, AppError> {
    let spots = app_state
        .overpass
        .fetch_spots(&payload.bbox, &payload.categories)
        .await?;
    let ids = app_state.sqlite_provider.create_spots(spots).await?;
    info!(imported = ids.len(), "Imported spots from Overpass.");
    Ok(ApiJson(ImportResponse {
        imported: ids.len(),
    }))
}
