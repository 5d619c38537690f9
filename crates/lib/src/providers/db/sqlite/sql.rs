//! # SQLite Specific SQL Queries
//!
//! This module centralizes SQL query strings for the SQLite provider.
//! This makes the core logic cleaner and isolates database-specific syntax.

pub const CREATE_SPOTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS spots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        category TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        address TEXT,
        image_url TEXT,
        rating REAL NOT NULL DEFAULT 0,
        opening_time TEXT,
        closing_time TEXT,
        closed_days TEXT,
        created_at TEXT NOT NULL,
        created_by TEXT,
        source_ref TEXT UNIQUE
    );
";

pub const CREATE_USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        last_seen TEXT NOT NULL
    );
";

pub const CREATE_FAVORITES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS favorites (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        spot_id INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE(user_id, spot_id)
    );
";

pub const CREATE_VISIT_HISTORY_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS visit_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        spot_id INTEGER NOT NULL,
        visited_at TEXT NOT NULL,
        rating INTEGER,
        comment TEXT
    );
";

pub const CREATE_USER_PREFERENCES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS user_preferences (
        user_id TEXT PRIMARY KEY,
        preferred_categories TEXT NOT NULL DEFAULT '[]',
        avoided_categories TEXT NOT NULL DEFAULT '[]',
        max_distance_km REAL,
        max_duration_hours REAL,
        updated_at TEXT NOT NULL
    );
";

pub const CREATE_RECOMMENDATION_HISTORY_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS recommendation_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        spot_id INTEGER NOT NULL,
        recommended_at TEXT NOT NULL,
        was_accepted INTEGER NOT NULL DEFAULT 0
    );
";

pub const CREATE_ROUTE_HISTORY_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS route_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        route_hash TEXT NOT NULL,
        spot_ids TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

/// Every table the application needs, in creation order.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_SPOTS_TABLE,
    CREATE_USERS_TABLE,
    CREATE_FAVORITES_TABLE,
    CREATE_VISIT_HISTORY_TABLE,
    CREATE_USER_PREFERENCES_TABLE,
    CREATE_RECOMMENDATION_HISTORY_TABLE,
    CREATE_ROUTE_HISTORY_TABLE,
];

/// The column list every spot query selects, in the order `spot_from_row` reads it.
pub const SPOT_COLUMNS: &str = "id, name, description, category, latitude, longitude, address, image_url, rating, opening_time, closing_time, closed_days, created_at, created_by, source_ref";

pub const SELECT_SOURCE_REFS: &str = "SELECT source_ref FROM spots WHERE source_ref IS NOT NULL";

pub const INSERT_SPOT: &str = "
    INSERT INTO spots (name, description, category, latitude, longitude, address, image_url, rating, opening_time, closing_time, closed_days, created_at, created_by, source_ref)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    RETURNING id
";

/// Returns the nearest-spots query.
///
/// The haversine distance is computed in SQL. The query expects three
/// parameters: the origin latitude twice, then the origin longitude.
///
/// # Arguments
///
/// * `limit`: The maximum number of results to return.
pub fn nearby_spots(limit: u32) -> String {
    format!(
        "
        SELECT {SPOT_COLUMNS},
            6371.0 * 2.0 * asin(sqrt(
                pow(sin(radians(latitude - ?) / 2.0), 2)
                + cos(radians(?)) * cos(radians(latitude))
                  * pow(sin(radians(longitude - ?) / 2.0), 2)
            )) AS distance_km
        FROM spots
        ORDER BY distance_km ASC
        LIMIT {limit};
    "
    )
}

pub const VISIT_HISTORY: &str = "
    SELECT v.id, v.spot_id, s.name, s.category, v.visited_at, v.rating, v.comment
    FROM visit_history v
    JOIN spots s ON s.id = v.spot_id
    WHERE v.user_id = ?
    ORDER BY v.visited_at DESC, v.id DESC
";

pub const FAVORITE_CATEGORY: &str = "
    SELECT s.category, COUNT(*) AS high_ratings
    FROM visit_history v
    JOIN spots s ON s.id = v.spot_id
    WHERE v.user_id = ? AND v.rating >= 4
    GROUP BY s.category
    ORDER BY high_ratings DESC
    LIMIT 1
";

pub const UPSERT_PREFERENCES: &str = "
    INSERT INTO user_preferences (user_id, preferred_categories, avoided_categories, max_distance_km, max_duration_hours, updated_at)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT(user_id) DO UPDATE SET
        preferred_categories = excluded.preferred_categories,
        avoided_categories = excluded.avoided_categories,
        max_distance_km = excluded.max_distance_km,
        max_duration_hours = excluded.max_duration_hours,
        updated_at = excluded.updated_at
";
