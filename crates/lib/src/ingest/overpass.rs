//! # Overpass POI Import
//!
//! Queries an Overpass API endpoint for the OpenStreetMap features that map
//! onto spot categories and converts them into spot records.
//!
//! | Category | OSM tags |
//! |---|---|
//! | `drive` | `tourism=viewpoint`, `tourism=attraction` |
//! | `restaurant` | `amenity=restaurant`, `amenity=cafe`, `amenity=fast_food` |
//! | `rest` | `highway=rest_area`, `highway=services` |

use crate::{categories::Category, errors::SpotError, types::NewSpot};
use reqwest::Client;
use serde::Deserialize;
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, info};

/// Marks spots created by this importer.
pub const OVERPASS_CREATED_BY: &str = "overpass";

/// Address tags in the order they are joined into a single line.
const ADDRESS_TAGS: [&str; 6] = [
    "addr:province",
    "addr:city",
    "addr:suburb",
    "addr:quarter",
    "addr:street",
    "addr:housenumber",
];

/// A latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<(), SpotError> {
        let values = [self.south, self.west, self.north, self.east];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SpotError::InvalidInput(
                "bounding box must contain finite coordinates".to_string(),
            ));
        }
        if self.south >= self.north || self.west >= self.east {
            return Err(SpotError::InvalidInput(
                "bounding box must satisfy south < north and west < east".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.south) || !(-90.0..=90.0).contains(&self.north) {
            return Err(SpotError::InvalidInput(
                "latitude must be within [-90, 90]".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.west) || !(-180.0..=180.0).contains(&self.east) {
            return Err(SpotError::InvalidInput(
                "longitude must be within [-180, 180]".to_string(),
            ));
        }
        Ok(())
    }

    fn to_overpass(self) -> String {
        format!("({},{},{},{})", self.south, self.west, self.north, self.east)
    }
}

fn selector(category: Category) -> &'static str {
    match category {
        Category::Drive => r#"["tourism"~"^(viewpoint|attraction)$"]"#,
        Category::Restaurant => r#"["amenity"~"^(restaurant|cafe|fast_food)$"]"#,
        Category::Rest => r#"["highway"~"^(rest_area|services)$"]"#,
    }
}

/// Builds the Overpass QL query for the given categories.
///
/// An empty category list means every category.
pub fn build_query(bbox: &BoundingBox, categories: &[Category], timeout_secs: u64) -> String {
    let categories = if categories.is_empty() {
        &Category::ALL[..]
    } else {
        categories
    };
    let bbox = bbox.to_overpass();
    let lines = categories
        .iter()
        .flat_map(|category| {
            let selector = selector(*category);
            ["node", "way"].map(|kind| format!("  {kind}{selector}{bbox};"))
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("[out:json][timeout:{timeout_secs}];\n(\n{lines}\n);\nout center tags;")
}

/// Returns the spot category an element's tags describe, if any.
pub fn classify(tags: &BTreeMap<String, String>) -> Option<Category> {
    let has = |key: &str, values: &[&str]| {
        tags.get(key)
            .is_some_and(|v| values.contains(&v.as_str()))
    };
    if has("tourism", &["viewpoint", "attraction"]) {
        Some(Category::Drive)
    } else if has("amenity", &["restaurant", "cafe", "fast_food"]) {
        Some(Category::Restaurant)
    } else if has("highway", &["rest_area", "services"]) {
        Some(Category::Rest)
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn coordinates(&self) -> Option<(f64, f64)> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Some((lat, lon));
        }
        self.center.as_ref().map(|c| (c.lat, c.lon))
    }

    fn address(&self) -> Option<String> {
        if let Some(full) = self.tags.get("addr:full") {
            return Some(full.clone());
        }
        let parts: Vec<&str> = ADDRESS_TAGS
            .iter()
            .filter_map(|key| self.tags.get(*key).map(String::as_str))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    fn into_new_spot(self) -> Option<NewSpot> {
        let Some(name) = self.tags.get("name").filter(|n| !n.trim().is_empty()) else {
            debug!(element = self.id, kind = %self.element_type, "Skipping unnamed element.");
            return None;
        };
        let (latitude, longitude) = self.coordinates()?;
        if !latitude.is_finite() || !longitude.is_finite() {
            debug!(element = self.id, "Skipping element with non-finite coordinates.");
            return None;
        }
        let category = classify(&self.tags)?;
        Some(NewSpot {
            name: name.clone(),
            description: self.tags.get("description").cloned(),
            category,
            latitude,
            longitude,
            address: self.address(),
            image_url: self.tags.get("image").cloned(),
            rating: 0.0,
            opening_time: self.tags.get("opening_hours").cloned(),
            closing_time: None,
            closed_days: None,
            created_by: Some(OVERPASS_CREATED_BY.to_string()),
            source_ref: Some(format!("osm:{}/{}", self.element_type, self.id)),
        })
    }
}

/// Decodes an Overpass JSON body into spot records.
///
/// Unnamed elements, elements without usable coordinates and elements whose
/// tags match no category are dropped.
pub fn parse_spots(body: &str) -> Result<Vec<NewSpot>, SpotError> {
    let decoded: OverpassResponse = serde_json::from_str(body)
        .map_err(|e| SpotError::PoiSource(format!("invalid Overpass JSON payload: {e}")))?;
    Ok(decoded
        .elements
        .into_iter()
        .filter_map(OverpassElement::into_new_spot)
        .collect())
}

/// A client for one Overpass API endpoint.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: Client,
    api_url: String,
    timeout_secs: u64,
}

impl OverpassClient {
    pub fn new(api_url: String, timeout: Duration) -> Result<Self, SpotError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SpotError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            timeout_secs: timeout.as_secs().max(1),
        })
    }

    /// Fetches the POIs of the given categories inside `bbox`.
    pub async fn fetch_spots(
        &self,
        bbox: &BoundingBox,
        categories: &[Category],
    ) -> Result<Vec<NewSpot>, SpotError> {
        bbox.validate()?;
        let query = build_query(bbox, categories, self.timeout_secs);
        debug!(query = %query, "--> Sending Overpass query");

        let response = self
            .client
            .post(&self.api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|e| SpotError::PoiSource(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SpotError::PoiSource(e.to_string()))?;
        if !status.is_success() {
            return Err(SpotError::PoiSource(format!("{status}: {body}")));
        }

        let mut spots = parse_spots(&body)?;
        // Overpass may return features matching other selectors.
        if !categories.is_empty() {
            spots.retain(|spot| categories.contains(&spot.category));
        }
        info!(count = spots.len(), "Fetched spots from Overpass.");
        Ok(spots)
    }
}
