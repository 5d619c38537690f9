//! # Shared Constants
//!
//! Fixed figures and user-facing sentences shared by the recommendation and
//! route paths and by the server.

/// The default path for the main application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/drivespot.db";

/// Average speed assumed for scenic driving, in km/h.
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

/// Default one-way distance limit for recommendations.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 100.0;

/// Default one-way driving time limit for recommendations.
pub const DEFAULT_MAX_TIME_HOURS: f64 = 3.0;

/// Hard cap on candidates embedded into the recommendation prompt.
pub const RECOMMENDATION_CANDIDATE_LIMIT: usize = 30;

/// Recommendations issued within this many days are marked as recent.
pub const RECENT_RECOMMENDATION_DAYS: i64 = 7;

/// Below this many valid picks the deterministic fallback kicks in.
pub const MIN_RECOMMENDATIONS: usize = 3;

/// The fallback fills the list up to this many picks.
pub const MAX_FALLBACK_RECOMMENDATIONS: usize = 5;

pub const DEFAULT_DEPARTURE_TIME: &str = "10:00";

/// Time budget used when no valid return time is given.
pub const DEFAULT_AVAILABLE_HOURS: f64 = 8.0;

/// Share of the time budget reserved for driving; the rest is spent at stops.
pub const DRIVING_TIME_SHARE: f64 = 0.5;

/// The round-trip distance is divided by this to cap a single leg.
pub const ROUTE_LEG_DIVISOR: f64 = 3.0;

/// Stay used for a spot whose category has no entry.
pub const DEFAULT_STAY_MIN: i64 = 30;

/// Stay at the single destination of a fallback route.
pub const FALLBACK_STAY_MIN: i64 = 40;

/// How many of a user's latest route fingerprints are shown to the planner.
pub const RECENT_ROUTE_LIMIT: usize = 20;

pub const CURRENT_LOCATION_NAME: &str = "現在地";

pub const NO_MATCHING_SPOTS_MESSAGE: &str =
    "条件に合うスポットが見つかりませんでした。距離や時間の条件を緩めてみてください。";

pub const FALLBACK_RECOMMENDATION_MESSAGE: &str =
    "距離とカテゴリのバランスを考慮しておすすめを選びました。";

pub const NO_DRIVE_SPOTS_MESSAGE: &str = "条件に合うドライブスポットが見つかりませんでした。";

pub const FALLBACK_ROUTE_MESSAGE: &str = "おすすめのドライブスポットを選びました。";
