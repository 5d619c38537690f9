//! # Ingestion Logic
//!
//! Bulk import of spots from external POI sources. Fetched records are mapped
//! to [`NewSpot`](crate::types::NewSpot) and handed to the store in one
//! transaction by the caller.

pub mod overpass;

pub use overpass::{BoundingBox, OverpassClient};
