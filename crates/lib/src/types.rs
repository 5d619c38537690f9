//! # Shared Data Types
//!
//! Records persisted by the store and exchanged with the HTTP layer.

use crate::categories::Category;
use serde::{Deserialize, Serialize};

/// A point of interest that can be recommended or placed on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub rating: f64,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub closed_days: Option<String>,
    pub created_at: String,
    pub created_by: Option<String>,
    /// Identifies the upstream record a spot was imported from, e.g. `osm:node/42`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

/// The payload for creating a spot, either through the API or a bulk import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpot {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub opening_time: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
    #[serde(default)]
    pub closed_days: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

impl NewSpot {
    /// Checks the fields the store cannot enforce on its own.
    pub fn validate(&self) -> Result<(), crate::SpotError> {
        if self.name.trim().is_empty() {
            return Err(crate::SpotError::InvalidInput(
                "spot name must not be empty".to_string(),
            ));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(crate::SpotError::InvalidInput(format!(
                "latitude {} is out of range",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(crate::SpotError::InvalidInput(format!(
                "longitude {} is out of range",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// A spot together with its great-circle distance from a query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbySpot {
    #[serde(flatten)]
    pub spot: Spot,
    pub distance_km: f64,
}

/// One entry of a user's visit history, joined with the visited spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: i64,
    pub spot_id: i64,
    pub spot_name: String,
    pub spot_category: Category,
    pub visited_at: String,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

/// Aggregate visit statistics used to personalise recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_visits: i64,
    /// The category with the most visits rated 4 or higher, if any.
    pub favorite_category: Option<Category>,
}

/// Declared preferences of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub preferred_categories: Vec<Category>,
    #[serde(default)]
    pub avoided_categories: Vec<Category>,
    #[serde(default)]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub max_duration_hours: Option<f64>,
    #[serde(default, skip_deserializing)]
    pub updated_at: Option<String>,
}

/// A previously generated route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub id: i64,
    pub route_hash: String,
    pub spot_ids: Vec<i64>,
    pub created_at: String,
}
