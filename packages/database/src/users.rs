//! Query functions for user accounts and manager profiles.

use crimewatch_crime_models::{AccountStatus, UserRole};
use crimewatch_database_models::{
    ManagerAccountRow, ManagerProfileRow, ManagerUpdate, NewManager, SubjectRow, UserRow,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, utc};

async fn query_user(
    db: &dyn Database,
    sql: &str,
    params: &[DatabaseValue],
) -> Result<Option<UserRow>, DbError> {
    let rows = db.query_raw_params(sql, params).await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let role_str: String = row.to_value("role").unwrap_or_default();
    let status_str: String = row.to_value("status").unwrap_or_default();
    let last_login_naive: Option<chrono::NaiveDateTime> =
        row.to_value("last_login").unwrap_or(None);

    Ok(Some(UserRow {
        id: row.to_value("id").unwrap_or(0),
        email: row.to_value("email").unwrap_or_default(),
        password_digest: row.to_value("password_digest").unwrap_or_default(),
        name: row.to_value("name").unwrap_or_default(),
        role: role_str.parse().unwrap_or(UserRole::Manager),
        status: status_str.parse().unwrap_or(AccountStatus::Inactive),
        last_login: last_login_naive.map(utc),
    }))
}

/// Looks up a user account by its login email.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn find_user_by_email(
    db: &dyn Database,
    email: &str,
) -> Result<Option<UserRow>, DbError> {
    query_user(
        db,
        "SELECT id, email, password_digest, name, role, status, last_login
         FROM users WHERE email = $1",
        &[DatabaseValue::String(email.to_string())],
    )
    .await
}

/// Looks up a user account by its primary key.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_user(db: &dyn Database, user_id: i64) -> Result<Option<UserRow>, DbError> {
    query_user(
        db,
        "SELECT id, email, password_digest, name, role, status, last_login
         FROM users WHERE id = $1",
        &[DatabaseValue::Int64(user_id)],
    )
    .await
}

/// Inserts a manager account together with its profile and returns the new
/// user ID.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub async fn insert_manager(db: &dyn Database, manager: &NewManager) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO users (email, password_digest, name, role, status)
             VALUES ($1, $2, $3, 'manager', 'active')
             RETURNING id",
            &[
                DatabaseValue::String(manager.email.clone()),
                DatabaseValue::String(manager.password_digest.clone()),
                DatabaseValue::String(manager.name.clone()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get user id from insert".to_string(),
    })?;

    let user_id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse user id: {e}"),
    })?;

    db.exec_raw_params(
        "INSERT INTO manager_profiles (user_id, organization, map_url, latitude, longitude)
         VALUES ($1, $2, $3, $4, $5)",
        &[
            DatabaseValue::Int64(user_id),
            DatabaseValue::String(manager.organization.clone()),
            manager
                .map_url
                .as_ref()
                .map_or(DatabaseValue::Null, |u| DatabaseValue::String(u.clone())),
            manager
                .latitude
                .map_or(DatabaseValue::Null, DatabaseValue::Real64),
            manager
                .longitude
                .map_or(DatabaseValue::Null, DatabaseValue::Real64),
        ],
    )
    .await?;

    Ok(user_id)
}

/// Lists all manager accounts with their profiles, oldest account first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_managers(db: &dyn Database) -> Result<Vec<ManagerAccountRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT u.id, u.name, u.email, u.role, u.status, u.last_login,
                    mp.organization, mp.map_url
             FROM users u
             LEFT JOIN manager_profiles mp ON mp.user_id = u.id
             WHERE u.role = 'manager'
             ORDER BY u.id",
            &[],
        )
        .await?;

    let mut managers = Vec::with_capacity(rows.len());

    for row in &rows {
        let role_str: String = row.to_value("role").unwrap_or_default();
        let status_str: String = row.to_value("status").unwrap_or_default();
        let last_login_naive: Option<chrono::NaiveDateTime> =
            row.to_value("last_login").unwrap_or(None);

        managers.push(ManagerAccountRow {
            id: row.to_value("id").unwrap_or(0),
            name: row.to_value("name").unwrap_or_default(),
            email: row.to_value("email").unwrap_or_default(),
            role: role_str.parse().unwrap_or(UserRole::Manager),
            status: status_str.parse().unwrap_or(AccountStatus::Inactive),
            last_login: last_login_naive.map(utc),
            organization: row.to_value("organization").unwrap_or(None),
            map_url: row.to_value("map_url").unwrap_or(None),
        });
    }

    Ok(managers)
}

/// Updates a manager's account details and profile.
///
/// Returns the number of user rows affected, so callers can distinguish a
/// missing account from a successful update.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub async fn update_manager(
    db: &dyn Database,
    user_id: i64,
    update: &ManagerUpdate,
) -> Result<u64, DbError> {
    let affected = db
        .exec_raw_params(
            "UPDATE users SET name = $2, email = $3 WHERE id = $1",
            &[
                DatabaseValue::Int64(user_id),
                DatabaseValue::String(update.name.clone()),
                DatabaseValue::String(update.email.clone()),
            ],
        )
        .await?;

    db.exec_raw_params(
        "UPDATE manager_profiles SET organization = $2, map_url = $3 WHERE user_id = $1",
        &[
            DatabaseValue::Int64(user_id),
            update
                .organization
                .as_ref()
                .map_or(DatabaseValue::Null, |o| DatabaseValue::String(o.clone())),
            update
                .map_url
                .as_ref()
                .map_or(DatabaseValue::Null, |u| DatabaseValue::String(u.clone())),
        ],
    )
    .await?;

    Ok(affected)
}

/// Sets the status of a user account.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn set_user_status(
    db: &dyn Database,
    user_id: i64,
    status: AccountStatus,
) -> Result<u64, DbError> {
    let affected = db
        .exec_raw_params(
            "UPDATE users SET status = $2 WHERE id = $1",
            &[
                DatabaseValue::Int64(user_id),
                DatabaseValue::String(status.as_ref().to_string()),
            ],
        )
        .await?;

    Ok(affected)
}

/// Records a successful login for a user account.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn update_last_login(db: &dyn Database, user_id: i64) -> Result<(), DbError> {
    db.exec_raw_params(
        "UPDATE users SET last_login = NOW() WHERE id = $1",
        &[DatabaseValue::Int64(user_id)],
    )
    .await?;

    Ok(())
}

/// Replaces a user's stored password digest.
///
/// Used both for legacy plaintext upgrades on login and for password
/// changes.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn update_password(
    db: &dyn Database,
    user_id: i64,
    password_digest: &str,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "UPDATE users SET password_digest = $2 WHERE id = $1",
        &[
            DatabaseValue::Int64(user_id),
            DatabaseValue::String(password_digest.to_string()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches the analytics subject for a manager: their profile joined with
/// the account's display name.
///
/// Returns `None` when the user has no manager profile.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn subject_profile(
    db: &dyn Database,
    user_id: i64,
) -> Result<Option<SubjectRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT u.id as user_id, u.name, mp.organization, mp.map_url,
                    mp.latitude, mp.longitude
             FROM users u
             JOIN manager_profiles mp ON mp.user_id = u.id
             WHERE u.id = $1",
            &[DatabaseValue::Int64(user_id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    Ok(Some(SubjectRow {
        user_id: row.to_value("user_id").unwrap_or(0),
        name: row.to_value("name").unwrap_or_default(),
        organization: row.to_value("organization").unwrap_or_default(),
        map_url: row.to_value("map_url").unwrap_or(None),
        latitude: row.to_value("latitude").unwrap_or(None),
        longitude: row.to_value("longitude").unwrap_or(None),
    }))
}

/// Fetches the profile-page slice for a manager account.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn manager_profile(
    db: &dyn Database,
    user_id: i64,
) -> Result<Option<ManagerProfileRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT u.name, u.email, mp.organization, mp.map_url
             FROM users u
             LEFT JOIN manager_profiles mp ON mp.user_id = u.id
             WHERE u.id = $1",
            &[DatabaseValue::Int64(user_id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    Ok(Some(ManagerProfileRow {
        name: row.to_value("name").unwrap_or_default(),
        email: row.to_value("email").unwrap_or_default(),
        organization: row.to_value("organization").unwrap_or(None),
        map_url: row.to_value("map_url").unwrap_or(None),
    }))
}
