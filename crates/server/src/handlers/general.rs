//! # General Route Handlers
//!
//! The single-page front-end, the health check and the category table.

use super::{ApiJson, AppError, AppState};
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use drivespot::{CategoryInfo, CATEGORY_TABLE};
use std::path::Path;
use tracing::warn;

/// The handler for the root (`/`) endpoint.
pub async fn root(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let path = Path::new(&app_state.config.templates_dir).join("index.html");
    let page = tokio::fs::read_to_string(&path).await.map_err(|e| {
        warn!(path = %path.display(), "Failed to read template: {e}");
        AppError::Internal(anyhow::anyhow!("template '{}' is unavailable", path.display()))
    })?;
    Ok((
        [(header::HeaderName::from_static("permissions-policy"), "geolocation=(self)")],
        Html(page),
    ))
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Returns the category metadata the front-end renders filters and legends from.
pub async fn categories_handler() -> ApiJson<&'static [CategoryInfo]> {
    ApiJson(CATEGORY_TABLE.as_slice())
}
