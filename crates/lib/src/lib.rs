//! # Drive Spot Recommender
//!
//! Domain library for recommending and sequencing drive spots around a
//! user's position. Spots are filtered geographically, then a chat-completion
//! model ranks or orders the candidates; every model answer is validated and
//! backed by a deterministic fallback.
//!
//! - [`recommend`]: candidate filter and spot recommendations.
//! - [`route`]: round-trip route planning.
//! - [`providers`]: AI providers and the SQLite store.
//! - [`ingest`]: bulk import from Overpass.

pub mod categories;
pub mod constants;
pub mod errors;
pub mod extract;
pub mod geo;
pub mod ingest;
pub mod prompts;
pub mod providers;
pub mod recommend;
pub mod route;
pub mod types;

pub use categories::{Category, CategoryInfo, CATEGORY_TABLE};
pub use errors::SpotError;
pub use prompts::TaskPrompt;
pub use recommend::{RecommendRequest, RecommendResponse, RecommendSettings};
pub use route::{RouteRequest, RouteResponse, RouteSettings};
