//! Query functions for crime reports.

use crimewatch_database_models::{
    CrimeRow, CrimeWithLocationRow, LocationCrimeRow, NewCrime, RecentCrimeRow,
};
use crimewatch_geo::bbox::BoundingBox;
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, utc};

fn optional_description(description: Option<&String>) -> DatabaseValue {
    description.map_or(DatabaseValue::Null, |d| DatabaseValue::String(d.clone()))
}

async fn query_crimes(
    db: &dyn Database,
    sql: &str,
    params: &[DatabaseValue],
) -> Result<Vec<CrimeRow>, DbError> {
    let rows = db.query_raw_params(sql, params).await?;

    let mut crimes = Vec::with_capacity(rows.len());

    for row in &rows {
        let occurred_at_naive: chrono::NaiveDateTime =
            row.to_value("occurred_at").unwrap_or_default();

        crimes.push(CrimeRow {
            id: row.to_value("id").unwrap_or(0),
            location_id: row.to_value("location_id").unwrap_or(0),
            category: row.to_value("category").unwrap_or_default(),
            occurred_at: utc(occurred_at_naive),
            description: row.to_value("description").unwrap_or(None),
        });
    }

    Ok(crimes)
}

/// Lists crime reports, newest first, optionally restricted to a single
/// location.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_crimes(
    db: &dyn Database,
    location_id: Option<i64>,
) -> Result<Vec<CrimeRow>, DbError> {
    if let Some(id) = location_id {
        query_crimes(
            db,
            "SELECT id, location_id, category, occurred_at, description
             FROM crimes
             WHERE location_id = $1
             ORDER BY occurred_at DESC",
            &[DatabaseValue::Int64(id)],
        )
        .await
    } else {
        query_crimes(
            db,
            "SELECT id, location_id, category, occurred_at, description
             FROM crimes
             ORDER BY occurred_at DESC",
            &[],
        )
        .await
    }
}

/// Lists all crime reports joined with their location names, newest first.
/// Feeds the admin crime listing.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_crimes_with_locations(
    db: &dyn Database,
) -> Result<Vec<CrimeWithLocationRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT c.id, c.location_id, c.category, c.occurred_at, c.description,
                    l.name as location_name
             FROM crimes c
             LEFT JOIN locations l ON l.id = c.location_id
             ORDER BY c.occurred_at DESC",
            &[],
        )
        .await?;

    let mut crimes = Vec::with_capacity(rows.len());

    for row in &rows {
        let occurred_at_naive: chrono::NaiveDateTime =
            row.to_value("occurred_at").unwrap_or_default();

        crimes.push(CrimeWithLocationRow {
            id: row.to_value("id").unwrap_or(0),
            location_id: row.to_value("location_id").unwrap_or(0),
            category: row.to_value("category").unwrap_or_default(),
            occurred_at: utc(occurred_at_naive),
            description: row.to_value("description").unwrap_or(None),
            location_name: row.to_value("location_name").unwrap_or(None),
        });
    }

    Ok(crimes)
}

/// Lists the most recent crime reports for one location, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn recent_for_location(
    db: &dyn Database,
    location_id: i64,
    limit: u32,
) -> Result<Vec<CrimeRow>, DbError> {
    query_crimes(
        db,
        "SELECT id, location_id, category, occurred_at, description
         FROM crimes
         WHERE location_id = $1
         ORDER BY occurred_at DESC
         LIMIT $2",
        &[
            DatabaseValue::Int64(location_id),
            DatabaseValue::Int64(i64::from(limit)),
        ],
    )
    .await
}

/// Inserts a crime report and returns its new ID.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_crime(db: &dyn Database, crime: &NewCrime) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO crimes (location_id, category, occurred_at, description)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                DatabaseValue::Int64(crime.location_id),
                DatabaseValue::String(crime.category.clone()),
                DatabaseValue::DateTime(crime.occurred_at.naive_utc()),
                optional_description(crime.description.as_ref()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get crime id from insert".to_string(),
    })?;

    let id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse crime id: {e}"),
    })?;

    Ok(id)
}

/// Inserts a batch of crime reports, e.g. from a CSV import.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub async fn insert_crimes(db: &dyn Database, crimes: &[NewCrime]) -> Result<u64, DbError> {
    let mut inserted = 0u64;

    for crime in crimes {
        let result = db
            .exec_raw_params(
                "INSERT INTO crimes (location_id, category, occurred_at, description)
                 VALUES ($1, $2, $3, $4)",
                &[
                    DatabaseValue::Int64(crime.location_id),
                    DatabaseValue::String(crime.category.clone()),
                    DatabaseValue::DateTime(crime.occurred_at.naive_utc()),
                    optional_description(crime.description.as_ref()),
                ],
            )
            .await?;

        inserted += result;
    }

    Ok(inserted)
}

/// Counts the crime reports recorded at a location.
///
/// Used to refuse deleting locations that still have data attached.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn count_for_location(db: &dyn Database, location_id: i64) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(*) as crime_count FROM crimes WHERE location_id = $1",
            &[DatabaseValue::Int64(location_id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(0);
    };

    let count: i64 = row.to_value("crime_count").unwrap_or(0);
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Lists a page of the most recent crimes across all active locations,
/// newest first, with descriptions truncated for the public feed.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn recent_crimes(
    db: &dyn Database,
    limit: u32,
    offset: u32,
) -> Result<Vec<RecentCrimeRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT c.id, c.category, c.occurred_at, LEFT(c.description, 100) as description,
                    l.name as location_name, l.latitude, l.longitude
             FROM crimes c
             JOIN locations l ON l.id = c.location_id
             WHERE l.status = 'active'
             ORDER BY c.occurred_at DESC
             LIMIT $1 OFFSET $2",
            &[
                DatabaseValue::Int64(i64::from(limit)),
                DatabaseValue::Int64(i64::from(offset)),
            ],
        )
        .await?;

    let mut crimes = Vec::with_capacity(rows.len());

    for row in &rows {
        let occurred_at_naive: chrono::NaiveDateTime =
            row.to_value("occurred_at").unwrap_or_default();

        crimes.push(RecentCrimeRow {
            id: row.to_value("id").unwrap_or(0),
            category: row.to_value("category").unwrap_or_default(),
            occurred_at: utc(occurred_at_naive),
            description: row.to_value("description").unwrap_or(None),
            location_name: row.to_value("location_name").unwrap_or_default(),
            latitude: row.to_value("latitude").unwrap_or(0.0),
            longitude: row.to_value("longitude").unwrap_or(0.0),
        });
    }

    Ok(crimes)
}

/// Fetches every crime at an active location inside the bounding box,
/// newest first. This is the coarse prefilter for the analytics
/// aggregation; exact distances are computed by the caller.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn location_crimes_in_bbox(
    db: &dyn Database,
    bbox: &BoundingBox,
) -> Result<Vec<LocationCrimeRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT l.id as location_id, l.name as location_name,
                    l.latitude, l.longitude,
                    c.category, c.occurred_at, c.description
             FROM locations l
             JOIN crimes c ON c.location_id = l.id
             WHERE l.status = 'active'
               AND l.latitude BETWEEN $1 AND $2
               AND l.longitude BETWEEN $3 AND $4
             ORDER BY c.occurred_at DESC",
            &[
                DatabaseValue::Real64(bbox.min_latitude),
                DatabaseValue::Real64(bbox.max_latitude),
                DatabaseValue::Real64(bbox.min_longitude),
                DatabaseValue::Real64(bbox.max_longitude),
            ],
        )
        .await?;

    let mut crimes = Vec::with_capacity(rows.len());

    for row in &rows {
        let occurred_at_naive: chrono::NaiveDateTime =
            row.to_value("occurred_at").unwrap_or_default();

        crimes.push(LocationCrimeRow {
            location_id: row.to_value("location_id").unwrap_or(0),
            location_name: row.to_value("location_name").unwrap_or_default(),
            latitude: row.to_value("latitude").unwrap_or(0.0),
            longitude: row.to_value("longitude").unwrap_or(0.0),
            category: row.to_value("category").unwrap_or_default(),
            occurred_at: utc(occurred_at_naive),
            description: row.to_value("description").unwrap_or(None),
        });
    }

    Ok(crimes)
}

/// Counts the crimes at active locations inside the bounding box.
///
/// Backs the quick-stats estimate, which needs a count but not the rows
/// themselves.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn count_crimes_in_bbox(db: &dyn Database, bbox: &BoundingBox) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT COUNT(c.id) as crime_count
             FROM locations l
             JOIN crimes c ON c.location_id = l.id
             WHERE l.status = 'active'
               AND l.latitude BETWEEN $1 AND $2
               AND l.longitude BETWEEN $3 AND $4",
            &[
                DatabaseValue::Real64(bbox.min_latitude),
                DatabaseValue::Real64(bbox.max_latitude),
                DatabaseValue::Real64(bbox.min_longitude),
                DatabaseValue::Real64(bbox.max_longitude),
            ],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(0);
    };

    let count: i64 = row.to_value("crime_count").unwrap_or(0);
    Ok(u64::try_from(count).unwrap_or(0))
}
