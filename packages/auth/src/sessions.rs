//! Session lifecycle: issue on login, destroy on logout, purge on expiry.

use chrono::{DateTime, Duration, Utc};
use crimewatch_database_models::SessionRow;
use switchy_database::Database;
use uuid::Uuid;

use crate::AuthError;

/// How long an issued session stays valid.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Issues a fresh session for a user and stores it.
///
/// The token is an opaque UUID; the caller returns it to the client as the
/// bearer credential.
///
/// # Errors
///
/// Returns [`AuthError::Database`] if the insert fails.
pub async fn create_session(db: &dyn Database, user_id: i64) -> Result<SessionRow, AuthError> {
    let token = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    let expires_at = created_at + Duration::days(SESSION_TTL_DAYS);

    crimewatch_database::sessions::insert_session(db, &token, user_id, created_at, expires_at)
        .await?;

    Ok(SessionRow {
        token,
        user_id,
        created_at,
        expires_at,
    })
}

/// Destroys a session by token.
///
/// Returns whether a session was actually removed, so logout can tell a
/// stale token apart from a live one.
///
/// # Errors
///
/// Returns [`AuthError::Database`] if the delete fails.
pub async fn destroy_session(db: &dyn Database, token: &str) -> Result<bool, AuthError> {
    let removed = crimewatch_database::sessions::delete_session(db, token).await?;
    Ok(removed > 0)
}

/// Removes every expired session and returns how many were dropped.
///
/// Called by the background sweeper; [`verifier::SessionVerifier`] also
/// drops individual stale rows as it encounters them.
///
/// [`verifier::SessionVerifier`]: crate::verifier::SessionVerifier
///
/// # Errors
///
/// Returns [`AuthError::Database`] if the delete fails.
pub async fn purge_expired(db: &dyn Database) -> Result<u64, AuthError> {
    Ok(crimewatch_database::sessions::delete_expired_sessions(db, Utc::now()).await?)
}

/// Whether a session has passed its expiry instant.
#[must_use]
pub fn is_expired(session: &SessionRow, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> SessionRow {
        SessionRow {
            token: "00000000-0000-4000-8000-000000000000".to_string(),
            user_id: 1,
            created_at: expires_at - Duration::days(SESSION_TTL_DAYS),
            expires_at,
        }
    }

    #[test]
    fn expiry_is_inclusive_at_the_boundary() {
        let expires_at = Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap();
        let session = session_expiring_at(expires_at);

        assert!(!is_expired(&session, expires_at - Duration::seconds(1)));
        assert!(is_expired(&session, expires_at));
        assert!(is_expired(&session, expires_at + Duration::seconds(1)));
    }
}
