//! # User Handlers
//!
//! Everything scoped to the cookie identity: visit feedback, recommendation
//! acceptance, history, favorites and stored preferences.

use super::{ApiJson, ApiQuery, AppError, AppState};
use crate::identity::CurrentUser;
use axum::extract::{Path, State};
use drivespot::types::{RouteRecord, Spot, UserPreferences, VisitRecord};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const DEFAULT_HISTORY_LIMIT: u32 = 20;

#[derive(Deserialize, Debug)]
pub struct FeedbackRequest {
    pub spot_id: i64,
    /// 1 to 5 when present.
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SpotRef {
    pub spot_id: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

impl HistoryQuery {
    fn limit(&self) -> Result<u32, AppError> {
        match self.limit {
            None => Ok(DEFAULT_HISTORY_LIMIT),
            Some(0) => Err(AppError::BadRequest(
                "limit must be a positive integer".to_string(),
            )),
            Some(limit) => Ok(limit),
        }
    }
}

fn ok_status() -> ApiJson<Value> {
    ApiJson(json!({ "status": "ok" }))
}

async fn require_spot(app_state: &AppState, spot_id: i64) -> Result<(), AppError> {
    match app_state.sqlite_provider.get_spot(spot_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!("unknown spot_id: {spot_id}"))),
    }
}

/// `POST /api/feedback`
pub async fn feedback_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<FeedbackRequest>,
) -> Result<ApiJson<Value>, AppError> {
    if let Some(rating) = payload.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::BadRequest(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
    }
    require_spot(&app_state, payload.spot_id).await?;

    app_state
        .sqlite_provider
        .add_visit(
            &user_id,
            payload.spot_id,
            payload.rating,
            payload.comment.as_deref(),
        )
        .await?;
    info!(user_id = %user_id, spot_id = payload.spot_id, rating = ?payload.rating, "Recorded feedback.");
    Ok(ok_status())
}

/// `POST /api/accept`
pub async fn accept_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<SpotRef>,
) -> Result<ApiJson<Value>, AppError> {
    let updated = app_state
        .sqlite_provider
        .accept_recommendation(&user_id, payload.spot_id)
        .await?;
    info!(user_id = %user_id, spot_id = payload.spot_id, updated, "Accepted recommendation.");
    Ok(ok_status())
}

/// `GET /api/history[?limit]`
pub async fn history_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<ApiJson<Vec<VisitRecord>>, AppError> {
    let history = app_state
        .sqlite_provider
        .visit_history(&user_id, query.limit()?)
        .await?;
    Ok(ApiJson(history))
}

/// `GET /api/routes/history[?limit]`
pub async fn route_history_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<ApiJson<Vec<RouteRecord>>, AppError> {
    let routes = app_state
        .sqlite_provider
        .route_history(&user_id, query.limit()?)
        .await?;
    Ok(ApiJson(routes))
}

/// `GET /api/favorites`
pub async fn list_favorites_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<ApiJson<Vec<Spot>>, AppError> {
    let spots = app_state.sqlite_provider.favorite_spots(&user_id).await?;
    Ok(ApiJson(spots))
}

/// `POST /api/favorites`
pub async fn add_favorite_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<SpotRef>,
) -> Result<ApiJson<Value>, AppError> {
    require_spot(&app_state, payload.spot_id).await?;
    app_state
        .sqlite_provider
        .add_favorite(&user_id, payload.spot_id)
        .await?;
    Ok(ok_status())
}

/// `DELETE /api/favorites/{spot_id}`
pub async fn remove_favorite_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(spot_id): Path<i64>,
) -> Result<ApiJson<Value>, AppError> {
    if !app_state
        .sqlite_provider
        .remove_favorite(&user_id, spot_id)
        .await?
    {
        return Err(AppError::NotFound(format!(
            "spot {spot_id} is not a favorite"
        )));
    }
    Ok(ok_status())
}

/// `GET /api/preferences`
pub async fn get_preferences_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<ApiJson<UserPreferences>, AppError> {
    let preferences = app_state.sqlite_provider.get_preferences(&user_id).await?;
    Ok(ApiJson(preferences))
}

/// `PUT /api/preferences`
pub async fn put_preferences_handler(
    State(app_state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(payload): ApiJson<UserPreferences>,
) -> Result<ApiJson<UserPreferences>, AppError> {
    for (field, value) in [
        ("max_distance_km", payload.max_distance_km),
        ("max_duration_hours", payload.max_duration_hours),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value <= 0.0 {
                return Err(AppError::BadRequest(format!(
                    "{field} must be a positive number, got {value}"
                )));
            }
        }
    }
    let saved = app_state
        .sqlite_provider
        .upsert_preferences(&user_id, &payload)
        .await?;
    Ok(ApiJson(saved))
}
