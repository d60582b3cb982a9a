//! Query functions for monitored locations.

use crimewatch_crime_models::LocationStatus;
use crimewatch_database_models::{
    LocationCrimeCountRow, LocationRow, LocationStatsRow, LocationUpdate, NewLocation,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

fn optional_url(url: Option<&String>) -> DatabaseValue {
    url.map_or(DatabaseValue::Null, |u| DatabaseValue::String(u.clone()))
}

/// Lists all locations, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_locations(db: &dyn Database) -> Result<Vec<LocationRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, latitude, longitude, map_url, status
             FROM locations
             ORDER BY id DESC",
            &[],
        )
        .await?;

    let mut locations = Vec::with_capacity(rows.len());

    for row in &rows {
        let status_str: String = row.to_value("status").unwrap_or_default();

        locations.push(LocationRow {
            id: row.to_value("id").unwrap_or(0),
            name: row.to_value("name").unwrap_or_default(),
            latitude: row.to_value("latitude").unwrap_or(0.0),
            longitude: row.to_value("longitude").unwrap_or(0.0),
            map_url: row.to_value("map_url").unwrap_or(None),
            status: status_str.parse().unwrap_or(LocationStatus::Inactive),
        });
    }

    Ok(locations)
}

/// Looks up a location by its primary key.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_location(db: &dyn Database, id: i64) -> Result<Option<LocationRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, latitude, longitude, map_url, status
             FROM locations WHERE id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let status_str: String = row.to_value("status").unwrap_or_default();

    Ok(Some(LocationRow {
        id: row.to_value("id").unwrap_or(0),
        name: row.to_value("name").unwrap_or_default(),
        latitude: row.to_value("latitude").unwrap_or(0.0),
        longitude: row.to_value("longitude").unwrap_or(0.0),
        map_url: row.to_value("map_url").unwrap_or(None),
        status: status_str.parse().unwrap_or(LocationStatus::Inactive),
    }))
}

/// Inserts a location and returns its new ID.
///
/// New locations start out active.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_location(db: &dyn Database, location: &NewLocation) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO locations (name, latitude, longitude, map_url)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                DatabaseValue::String(location.name.clone()),
                DatabaseValue::Real64(location.latitude),
                DatabaseValue::Real64(location.longitude),
                optional_url(location.map_url.as_ref()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get location id from insert".to_string(),
    })?;

    let id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse location id: {e}"),
    })?;

    Ok(id)
}

/// Inserts a batch of locations, e.g. from a CSV import.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub async fn insert_locations(
    db: &dyn Database,
    locations: &[NewLocation],
) -> Result<u64, DbError> {
    let mut inserted = 0u64;

    for location in locations {
        let result = db
            .exec_raw_params(
                "INSERT INTO locations (name, latitude, longitude, map_url)
                 VALUES ($1, $2, $3, $4)",
                &[
                    DatabaseValue::String(location.name.clone()),
                    DatabaseValue::Real64(location.latitude),
                    DatabaseValue::Real64(location.longitude),
                    optional_url(location.map_url.as_ref()),
                ],
            )
            .await?;

        inserted += result;
    }

    Ok(inserted)
}

/// Updates a location's details.
///
/// Returns the number of rows affected, so callers can distinguish a
/// missing location from a successful update.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn update_location(
    db: &dyn Database,
    id: i64,
    update: &LocationUpdate,
) -> Result<u64, DbError> {
    let affected = db
        .exec_raw_params(
            "UPDATE locations SET name = $2, latitude = $3, longitude = $4, map_url = $5
             WHERE id = $1",
            &[
                DatabaseValue::Int64(id),
                DatabaseValue::String(update.name.clone()),
                DatabaseValue::Real64(update.latitude),
                DatabaseValue::Real64(update.longitude),
                optional_url(update.map_url.as_ref()),
            ],
        )
        .await?;

    Ok(affected)
}

/// Sets a location's status.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn set_location_status(
    db: &dyn Database,
    id: i64,
    status: LocationStatus,
) -> Result<u64, DbError> {
    let affected = db
        .exec_raw_params(
            "UPDATE locations SET status = $2 WHERE id = $1",
            &[
                DatabaseValue::Int64(id),
                DatabaseValue::String(status.as_ref().to_string()),
            ],
        )
        .await?;

    Ok(affected)
}

/// Deletes a location.
///
/// Callers are expected to check [`crate::crimes::count_for_location`]
/// first; deleting a location that still has crime reports is refused at
/// the API layer.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn delete_location(db: &dyn Database, id: i64) -> Result<u64, DbError> {
    let affected = db
        .exec_raw_params(
            "DELETE FROM locations WHERE id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    Ok(affected)
}

/// Lists every active location with its total crime count, highest count
/// first. Feeds the public heatmap.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn heatmap_counts(db: &dyn Database) -> Result<Vec<LocationCrimeCountRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT l.id, l.name, l.latitude, l.longitude, COUNT(c.id) as crime_count
             FROM locations l
             LEFT JOIN crimes c ON c.location_id = l.id
             WHERE l.status = 'active'
             GROUP BY l.id
             ORDER BY crime_count DESC",
            &[],
        )
        .await?;

    let mut counts = Vec::with_capacity(rows.len());

    for row in &rows {
        let crime_count: i64 = row.to_value("crime_count").unwrap_or(0);

        counts.push(LocationCrimeCountRow {
            id: row.to_value("id").unwrap_or(0),
            name: row.to_value("name").unwrap_or_default(),
            latitude: row.to_value("latitude").unwrap_or(0.0),
            longitude: row.to_value("longitude").unwrap_or(0.0),
            crime_count: u64::try_from(crime_count).unwrap_or(0),
        });
    }

    Ok(counts)
}

/// Fetches aggregate statistics for a single active location.
///
/// Returns `None` for unknown or inactive locations.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn location_stats(
    db: &dyn Database,
    id: i64,
) -> Result<Option<LocationStatsRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT l.id, l.name, l.latitude, l.longitude,
                    COUNT(c.id) as total_crimes,
                    COUNT(c.id) FILTER (
                        WHERE c.occurred_at >= NOW() - INTERVAL '30 days'
                    ) as recent_crimes,
                    string_agg(DISTINCT c.category, ',') as categories
             FROM locations l
             LEFT JOIN crimes c ON c.location_id = l.id
             WHERE l.id = $1 AND l.status = 'active'
             GROUP BY l.id",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let total_crimes: i64 = row.to_value("total_crimes").unwrap_or(0);
    let recent_crimes: i64 = row.to_value("recent_crimes").unwrap_or(0);
    let categories_joined: Option<String> = row.to_value("categories").unwrap_or(None);

    Ok(Some(LocationStatsRow {
        id: row.to_value("id").unwrap_or(0),
        name: row.to_value("name").unwrap_or_default(),
        latitude: row.to_value("latitude").unwrap_or(0.0),
        longitude: row.to_value("longitude").unwrap_or(0.0),
        total_crimes: u64::try_from(total_crimes).unwrap_or(0),
        recent_crimes: u64::try_from(recent_crimes).unwrap_or(0),
        categories: categories_joined
            .map(|joined| joined.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
    }))
}
