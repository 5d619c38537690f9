use super::{
    now_timestamp, opt_text, returning_id, spot_from_row, sql, value_real, value_text, SqliteProvider,
};
use crate::{
    categories::Category,
    errors::SpotError,
    types::{NearbySpot, NewSpot, Spot},
};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use turso::{Connection, Value as TursoValue};

fn insert_params(spot: &NewSpot, created_at: &str) -> Vec<TursoValue> {
    vec![
        TursoValue::Text(spot.name.clone()),
        opt_text(spot.description.as_deref()),
        TursoValue::Text(spot.category.as_str().to_string()),
        TursoValue::Real(spot.latitude),
        TursoValue::Real(spot.longitude),
        opt_text(spot.address.as_deref()),
        opt_text(spot.image_url.as_deref()),
        TursoValue::Real(spot.rating),
        opt_text(spot.opening_time.as_deref()),
        opt_text(spot.closing_time.as_deref()),
        opt_text(spot.closed_days.as_deref()),
        TursoValue::Text(created_at.to_string()),
        opt_text(spot.created_by.as_deref()),
        opt_text(spot.source_ref.as_deref()),
    ]
}

async fn collect_spots(conn: &Connection, query: &str, params: Vec<TursoValue>) -> Result<Vec<Spot>, SpotError> {
    let mut rows = conn.query(query, params).await?;
    let mut spots = Vec::new();
    while let Some(row) = rows.next().await? {
        spots.push(spot_from_row(&row)?);
    }
    Ok(spots)
}

async fn stored_source_refs(conn: &Connection) -> Result<HashSet<String>, SpotError> {
    let mut rows = conn.query(sql::SELECT_SOURCE_REFS, ()).await?;
    let mut refs = HashSet::new();
    while let Some(row) = rows.next().await? {
        if let Some(source_ref) = value_text(row.get_value(0)?) {
            refs.insert(source_ref);
        }
    }
    Ok(refs)
}

async fn insert_batch(conn: &Connection, spots: Vec<NewSpot>) -> Result<Vec<i64>, SpotError> {
    let mut seen = stored_source_refs(conn).await?;
    let created_at = now_timestamp();
    let mut ids = Vec::with_capacity(spots.len());
    for spot in spots {
        if let Err(e) = spot.validate() {
            warn!(name = %spot.name, error = %e, "Skipping invalid spot.");
            continue;
        }
        if let Some(source_ref) = &spot.source_ref {
            if !seen.insert(source_ref.clone()) {
                debug!(source_ref = %source_ref, "Skipping spot that is already stored.");
                continue;
            }
        }
        let rows = conn.query(sql::INSERT_SPOT, insert_params(&spot, &created_at)).await?;
        ids.push(returning_id(rows).await?);
    }
    Ok(ids)
}

impl SqliteProvider {
    /// Inserts a single spot and returns it as stored.
    pub async fn create_spot(&self, spot: NewSpot) -> Result<Spot, SpotError> {
        spot.validate()?;
        let conn = self.connect()?;
        let created_at = now_timestamp();
        let rows = conn
            .query(sql::INSERT_SPOT, insert_params(&spot, &created_at))
            .await?;
        let id = returning_id(rows).await?;
        info!(spot_id = id, name = %spot.name, "Created spot.");
        Ok(Spot {
            id,
            name: spot.name,
            description: spot.description,
            category: spot.category,
            latitude: spot.latitude,
            longitude: spot.longitude,
            address: spot.address,
            image_url: spot.image_url,
            rating: spot.rating,
            opening_time: spot.opening_time,
            closing_time: spot.closing_time,
            closed_days: spot.closed_days,
            created_at,
            created_by: spot.created_by,
            source_ref: spot.source_ref,
        })
    }

    /// Inserts a batch of spots within a single transaction.
    ///
    /// Invalid entries are skipped with a warning, as are entries whose
    /// `source_ref` is already stored or repeated earlier in the batch.
    /// Returns the ids of the inserted rows. On failure the transaction is
    /// rolled back and the first error is returned.
    pub async fn create_spots(&self, spots: Vec<NewSpot>) -> Result<Vec<i64>, SpotError> {
        if spots.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connect()?;
        info!("Starting database transaction to insert {} spots.", spots.len());
        conn.execute("BEGIN TRANSACTION", ()).await?;

        let inserted = insert_batch(&conn, spots).await;
        let ids = match inserted {
            Ok(ids) => ids,
            Err(e) => {
                if let Err(rollback_err) = conn.execute("ROLLBACK", ()).await {
                    warn!(error = %rollback_err, "Rollback after failed bulk insert also failed.");
                }
                return Err(e);
            }
        };

        conn.execute("COMMIT", ()).await?;
        info!("Transaction committed. Inserted {} spots.", ids.len());
        Ok(ids)
    }

    pub async fn get_spot(&self, id: i64) -> Result<Option<Spot>, SpotError> {
        let conn = self.connect()?;
        let query = format!("SELECT {} FROM spots WHERE id = ?", sql::SPOT_COLUMNS);
        let mut spots = collect_spots(&conn, &query, vec![TursoValue::Integer(id)]).await?;
        Ok(spots.pop())
    }

    /// Lists every spot in insertion order.
    pub async fn list_spots(&self) -> Result<Vec<Spot>, SpotError> {
        let conn = self.connect()?;
        let query = format!("SELECT {} FROM spots ORDER BY id ASC", sql::SPOT_COLUMNS);
        let spots = collect_spots(&conn, &query, Vec::new()).await?;
        debug!("Loaded {} spots.", spots.len());
        Ok(spots)
    }

    pub async fn list_spots_by_category(&self, category: Category) -> Result<Vec<Spot>, SpotError> {
        let conn = self.connect()?;
        let query = format!(
            "SELECT {} FROM spots WHERE category = ? ORDER BY id ASC",
            sql::SPOT_COLUMNS
        );
        collect_spots(
            &conn,
            &query,
            vec![TursoValue::Text(category.as_str().to_string())],
        )
        .await
    }

    /// Deletes a spot and its favorites. Returns `false` if it did not exist.
    pub async fn delete_spot(&self, id: i64) -> Result<bool, SpotError> {
        let conn = self.connect()?;
        let deleted = conn
            .execute("DELETE FROM spots WHERE id = ?", vec![TursoValue::Integer(id)])
            .await?;
        conn.execute(
            "DELETE FROM favorites WHERE spot_id = ?",
            vec![TursoValue::Integer(id)],
        )
        .await?;
        info!(spot_id = id, deleted, "Deleted spot.");
        Ok(deleted > 0)
    }

    /// Deletes every spot and favorite. Returns how many spots were removed.
    pub async fn delete_all_spots(&self) -> Result<u64, SpotError> {
        let conn = self.connect()?;
        let deleted = conn.execute("DELETE FROM spots", ()).await?;
        conn.execute("DELETE FROM favorites", ()).await?;
        info!(deleted, "Deleted all spots.");
        Ok(deleted)
    }

    /// Returns the spots closest to a point, nearest first.
    pub async fn nearby_spots(&self, lat: f64, lng: f64, limit: u32) -> Result<Vec<NearbySpot>, SpotError> {
        let conn = self.connect()?;
        let query = sql::nearby_spots(limit);
        let mut rows = conn
            .query(
                &query,
                vec![
                    TursoValue::Real(lat),
                    TursoValue::Real(lat),
                    TursoValue::Real(lng),
                ],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            let spot = spot_from_row(&row)?;
            let distance_km = value_real(row.get_value(15)?).unwrap_or_default();
            results.push(NearbySpot { spot, distance_km });
        }
        Ok(results)
    }
}
