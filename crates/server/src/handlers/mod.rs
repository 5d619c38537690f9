//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `drivespot-server`.
//! The handlers are split into sub-modules by the resource they serve.

pub mod general;
pub mod planner;
pub mod spots;
pub mod user;

// Re-export all handlers so the router can reach them under `handlers::`.
pub use general::*;
pub use planner::*;
pub use spots::*;
pub use user::*;

// Shared items used by the handler modules.
use super::{
    errors::{ApiJson, ApiQuery, AppError},
    state::AppState,
};
