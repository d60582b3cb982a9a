//! Query functions for authentication sessions.

use chrono::{DateTime, Utc};
use crimewatch_database_models::SessionRow;
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, utc};

/// Inserts a new session row.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_session(
    db: &dyn Database,
    token: &str,
    user_id: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "INSERT INTO sessions (token, user_id, created_at, expires_at)
         VALUES ($1, $2, $3, $4)",
        &[
            DatabaseValue::String(token.to_string()),
            DatabaseValue::Int64(user_id),
            DatabaseValue::DateTime(created_at.naive_utc()),
            DatabaseValue::DateTime(expires_at.naive_utc()),
        ],
    )
    .await?;

    Ok(())
}

/// Looks up a session by its token.
///
/// Expiry is not checked here; callers compare `expires_at` against their
/// own clock.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_session(db: &dyn Database, token: &str) -> Result<Option<SessionRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT token, user_id, created_at, expires_at
             FROM sessions WHERE token = $1",
            &[DatabaseValue::String(token.to_string())],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let created_at_naive: chrono::NaiveDateTime = row.to_value("created_at").unwrap_or_default();
    let expires_at_naive: chrono::NaiveDateTime = row.to_value("expires_at").unwrap_or_default();

    Ok(Some(SessionRow {
        token: row.to_value("token").unwrap_or_default(),
        user_id: row.to_value("user_id").unwrap_or(0),
        created_at: utc(created_at_naive),
        expires_at: utc(expires_at_naive),
    }))
}

/// Deletes a session by its token.
///
/// Returns the number of rows removed, so callers can tell whether the
/// token existed.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn delete_session(db: &dyn Database, token: &str) -> Result<u64, DbError> {
    let affected = db
        .exec_raw_params(
            "DELETE FROM sessions WHERE token = $1",
            &[DatabaseValue::String(token.to_string())],
        )
        .await?;

    Ok(affected)
}

/// Deletes every session that expired before the given instant.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn delete_expired_sessions(
    db: &dyn Database,
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    let affected = db
        .exec_raw_params(
            "DELETE FROM sessions WHERE expires_at < $1",
            &[DatabaseValue::DateTime(now.naive_utc())],
        )
        .await?;

    Ok(affected)
}
