use super::{
    days_ago_timestamp, now_timestamp, opt_real, opt_text, spot_from_row, sql, value_category,
    value_integer, value_real, value_text, SqliteProvider,
};
use crate::{
    categories::Category,
    errors::SpotError,
    types::{RouteRecord, Spot, UserPreferences, UserStats, VisitRecord},
};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use turso::Value as TursoValue;

fn text(value: &str) -> TursoValue {
    TursoValue::Text(value.to_string())
}

fn categories_from_json(raw: Option<String>) -> Vec<Category> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(categories) => categories,
        Err(e) => {
            warn!(error = %e, raw = %raw, "Ignoring unreadable stored category list.");
            Vec::new()
        }
    }
}

impl SqliteProvider {
    // --- Users ---

    /// Creates the user on first sight, otherwise bumps `last_seen`.
    pub async fn touch_user(&self, user_id: &str) -> Result<(), SpotError> {
        let conn = self.connect()?;
        let now = now_timestamp();
        let updated = conn
            .execute(
                "UPDATE users SET last_seen = ? WHERE id = ?",
                vec![text(&now), text(user_id)],
            )
            .await?;
        if updated > 0 {
            return Ok(());
        }

        match conn
            .execute(
                "INSERT INTO users (id, created_at, last_seen) VALUES (?, ?, ?)",
                vec![text(user_id), text(&now), text(&now)],
            )
            .await
        {
            Ok(_) => {
                info!(user_id = %user_id, "Registered new user.");
                Ok(())
            }
            // A concurrent request registered the same user first.
            Err(turso::Error::SqlExecutionFailure(msg))
                if msg.contains("UNIQUE constraint failed") =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    // --- Visits ---

    pub async fn add_visit(
        &self,
        user_id: &str,
        spot_id: i64,
        rating: Option<i64>,
        comment: Option<&str>,
    ) -> Result<i64, SpotError> {
        let conn = self.connect()?;
        let rows = conn
            .query(
                "INSERT INTO visit_history (user_id, spot_id, visited_at, rating, comment) VALUES (?, ?, ?, ?, ?) RETURNING id",
                vec![
                    text(user_id),
                    TursoValue::Integer(spot_id),
                    text(&now_timestamp()),
                    rating.map_or(TursoValue::Null, TursoValue::Integer),
                    opt_text(comment),
                ],
            )
            .await?;
        let id = super::returning_id(rows).await?;
        debug!(user_id = %user_id, spot_id, ?rating, "Recorded visit.");
        Ok(id)
    }

    /// The user's visits, newest first.
    pub async fn visit_history(&self, user_id: &str, limit: u32) -> Result<Vec<VisitRecord>, SpotError> {
        let conn = self.connect()?;
        let query = format!("{} LIMIT {limit}", sql::VISIT_HISTORY.trim_end());
        let mut rows = conn.query(&query, vec![text(user_id)]).await?;

        let mut history = Vec::new();
        while let Some(row) = rows.next().await? {
            history.push(VisitRecord {
                id: value_integer(row.get_value(0)?).unwrap_or_default(),
                spot_id: value_integer(row.get_value(1)?).unwrap_or_default(),
                spot_name: value_text(row.get_value(2)?).unwrap_or_default(),
                spot_category: value_category(row.get_value(3)?)?,
                visited_at: value_text(row.get_value(4)?).unwrap_or_default(),
                rating: value_integer(row.get_value(5)?),
                comment: value_text(row.get_value(6)?),
            });
        }
        Ok(history)
    }

    /// Every spot the user has visited at least once.
    pub async fn visited_spot_ids(&self, user_id: &str) -> Result<HashSet<i64>, SpotError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT DISTINCT spot_id FROM visit_history WHERE user_id = ?",
                vec![text(user_id)],
            )
            .await?;
        let mut ids = HashSet::new();
        while let Some(row) = rows.next().await? {
            if let Some(id) = value_integer(row.get_value(0)?) {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, SpotError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM visit_history WHERE user_id = ?",
                vec![text(user_id)],
            )
            .await?;
        let total_visits = match rows.next().await? {
            Some(row) => value_integer(row.get_value(0)?).unwrap_or_default(),
            None => 0,
        };

        let mut rows = conn
            .query(sql::FAVORITE_CATEGORY, vec![text(user_id)])
            .await?;
        let favorite_category = match rows.next().await? {
            Some(row) => Some(value_category(row.get_value(0)?)?),
            None => None,
        };

        Ok(UserStats {
            total_visits,
            favorite_category,
        })
    }

    // --- Recommendations ---

    pub async fn add_recommendation(&self, user_id: &str, spot_id: i64) -> Result<(), SpotError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO recommendation_history (user_id, spot_id, recommended_at, was_accepted) VALUES (?, ?, ?, 0)",
            vec![text(user_id), TursoValue::Integer(spot_id), text(&now_timestamp())],
        )
        .await?;
        Ok(())
    }

    /// Spots recommended to the user within the last `days` days.
    pub async fn recent_recommendation_ids(&self, user_id: &str, days: i64) -> Result<HashSet<i64>, SpotError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT DISTINCT spot_id FROM recommendation_history WHERE user_id = ? AND recommended_at > ?",
                vec![text(user_id), text(&days_ago_timestamp(days))],
            )
            .await?;
        let mut ids = HashSet::new();
        while let Some(row) = rows.next().await? {
            if let Some(id) = value_integer(row.get_value(0)?) {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    /// Marks every recommendation of `spot_id` to the user as accepted.
    pub async fn accept_recommendation(&self, user_id: &str, spot_id: i64) -> Result<u64, SpotError> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE recommendation_history SET was_accepted = 1 WHERE user_id = ? AND spot_id = ?",
                vec![text(user_id), TursoValue::Integer(spot_id)],
            )
            .await?;
        debug!(user_id = %user_id, spot_id, updated, "Accepted recommendation.");
        Ok(updated)
    }

    // --- Routes ---

    pub async fn add_route_history(
        &self,
        user_id: &str,
        route_hash: &str,
        spot_ids: &[i64],
    ) -> Result<(), SpotError> {
        let conn = self.connect()?;
        let ids_json = serde_json::to_string(spot_ids)?;
        conn.execute(
            "INSERT INTO route_history (user_id, route_hash, spot_ids, created_at) VALUES (?, ?, ?, ?)",
            vec![text(user_id), text(route_hash), text(&ids_json), text(&now_timestamp())],
        )
        .await?;
        Ok(())
    }

    /// The fingerprints of the user's latest routes, newest first.
    pub async fn recent_route_hashes(&self, user_id: &str, limit: usize) -> Result<Vec<String>, SpotError> {
        let conn = self.connect()?;
        let query = format!(
            "SELECT route_hash FROM route_history WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT {limit}"
        );
        let mut rows = conn.query(&query, vec![text(user_id)]).await?;
        let mut hashes = Vec::new();
        while let Some(row) = rows.next().await? {
            if let Some(hash) = value_text(row.get_value(0)?) {
                hashes.push(hash);
            }
        }
        Ok(hashes)
    }

    pub async fn route_history(&self, user_id: &str, limit: u32) -> Result<Vec<RouteRecord>, SpotError> {
        let conn = self.connect()?;
        let query = format!(
            "SELECT id, route_hash, spot_ids, created_at FROM route_history WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT {limit}"
        );
        let mut rows = conn.query(&query, vec![text(user_id)]).await?;
        let mut routes = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw_ids = value_text(row.get_value(2)?).unwrap_or_default();
            routes.push(RouteRecord {
                id: value_integer(row.get_value(0)?).unwrap_or_default(),
                route_hash: value_text(row.get_value(1)?).unwrap_or_default(),
                spot_ids: serde_json::from_str(&raw_ids)?,
                created_at: value_text(row.get_value(3)?).unwrap_or_default(),
            });
        }
        Ok(routes)
    }

    // --- Favorites ---

    /// Adds a favorite. Adding the same spot twice is a no-op.
    pub async fn add_favorite(&self, user_id: &str, spot_id: i64) -> Result<(), SpotError> {
        let conn = self.connect()?;
        let mut existing = conn
            .query(
                "SELECT id FROM favorites WHERE user_id = ? AND spot_id = ?",
                vec![text(user_id), TursoValue::Integer(spot_id)],
            )
            .await?;
        if existing.next().await?.is_some() {
            return Ok(());
        }
        conn.execute(
            "INSERT INTO favorites (user_id, spot_id, created_at) VALUES (?, ?, ?)",
            vec![text(user_id), TursoValue::Integer(spot_id), text(&now_timestamp())],
        )
        .await?;
        Ok(())
    }

    /// Removes a favorite. Returns `false` if it was not present.
    pub async fn remove_favorite(&self, user_id: &str, spot_id: i64) -> Result<bool, SpotError> {
        let conn = self.connect()?;
        let deleted = conn
            .execute(
                "DELETE FROM favorites WHERE user_id = ? AND spot_id = ?",
                vec![text(user_id), TursoValue::Integer(spot_id)],
            )
            .await?;
        Ok(deleted > 0)
    }

    /// The user's favorite spots, most recently added first.
    pub async fn favorite_spots(&self, user_id: &str) -> Result<Vec<Spot>, SpotError> {
        let conn = self.connect()?;
        let columns = sql::SPOT_COLUMNS
            .split(", ")
            .map(|c| format!("s.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "SELECT {columns} FROM favorites f JOIN spots s ON s.id = f.spot_id WHERE f.user_id = ? ORDER BY f.created_at DESC, f.id DESC"
        );
        let mut rows = conn.query(&query, vec![text(user_id)]).await?;
        let mut spots = Vec::new();
        while let Some(row) = rows.next().await? {
            spots.push(spot_from_row(&row)?);
        }
        Ok(spots)
    }

    // --- Preferences ---

    /// The stored preferences, or defaults when none were saved.
    pub async fn get_preferences(&self, user_id: &str) -> Result<UserPreferences, SpotError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT preferred_categories, avoided_categories, max_distance_km, max_duration_hours, updated_at FROM user_preferences WHERE user_id = ?",
                vec![text(user_id)],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(UserPreferences::default());
        };
        Ok(UserPreferences {
            preferred_categories: categories_from_json(value_text(row.get_value(0)?)),
            avoided_categories: categories_from_json(value_text(row.get_value(1)?)),
            max_distance_km: value_real(row.get_value(2)?),
            max_duration_hours: value_real(row.get_value(3)?),
            updated_at: value_text(row.get_value(4)?),
        })
    }

    pub async fn upsert_preferences(
        &self,
        user_id: &str,
        preferences: &UserPreferences,
    ) -> Result<UserPreferences, SpotError> {
        let conn = self.connect()?;
        let updated_at = now_timestamp();
        conn.execute(
            sql::UPSERT_PREFERENCES,
            vec![
                text(user_id),
                text(&serde_json::to_string(&preferences.preferred_categories)?),
                text(&serde_json::to_string(&preferences.avoided_categories)?),
                opt_real(preferences.max_distance_km),
                opt_real(preferences.max_duration_hours),
                text(&updated_at),
            ],
        )
        .await?;
        info!(user_id = %user_id, "Saved preferences.");
        Ok(UserPreferences {
            updated_at: Some(updated_at),
            ..preferences.clone()
        })
    }
}
