//! HTTP handler functions for the `CrimeWatch` API.
//!
//! Request bodies keep their fields optional and are validated here, so
//! missing or malformed input is answered with field-specific JSON
//! messages instead of extractor failures. Error responses share one
//! envelope: `{success: false, error}` plus a machine-readable `code` on
//! authentication failures.

pub mod admin;
pub mod assistant;
pub mod auth;
pub mod manager;
pub mod public;

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use crimewatch_auth::verifier::bearer_token;
use crimewatch_auth::{AuthError, AuthenticatedUser, require_admin, require_manager};
use crimewatch_server_models::{ApiError, ApiHealth};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Pulls the bearer token out of the `Authorization` header.
pub(crate) fn request_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

/// Verifies the bearer token on a protected route.
async fn authenticate(state: &AppState, req: &HttpRequest) -> Result<AuthenticatedUser, AuthError> {
    let token = request_token(req).ok_or(AuthError::NoToken)?;
    state.verifier.verify(state.db.as_ref(), token).await
}

/// Authenticates the request and requires the admin role.
pub(crate) async fn admin_guard(
    state: &AppState,
    req: &HttpRequest,
) -> Result<AuthenticatedUser, AuthError> {
    let user = authenticate(state, req).await?;
    require_admin(&user)?;
    Ok(user)
}

/// Authenticates the request and requires an active manager account.
pub(crate) async fn manager_guard(
    state: &AppState,
    req: &HttpRequest,
) -> Result<AuthenticatedUser, AuthError> {
    let user = authenticate(state, req).await?;
    require_manager(&user)?;
    Ok(user)
}

/// Maps an authentication failure to its HTTP response.
pub(crate) fn auth_failure(error: &AuthError) -> HttpResponse {
    if matches!(error, AuthError::Config { .. } | AuthError::Database(_)) {
        log::error!("Auth backend failure: {error}");
    }

    let mut response = match error.status() {
        401 => HttpResponse::Unauthorized(),
        403 => HttpResponse::Forbidden(),
        _ => HttpResponse::InternalServerError(),
    };
    response.json(ApiError::with_code(error.to_string(), error.code()))
}

/// Treats an absent or empty optional field as missing.
pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Validates WGS84 coordinate ranges, reporting the offending field.
pub(crate) fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90 degrees.");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180 degrees.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_count_as_missing() {
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&Some("admin@example.com".to_string())), Some("admin@example.com"));
    }

    #[test]
    fn coordinate_ranges_are_inclusive() {
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.0, -180.0).is_ok());
        assert_eq!(
            validate_coordinates(90.1, 0.0),
            Err("Latitude must be between -90 and 90 degrees.")
        );
        assert_eq!(
            validate_coordinates(0.0, -180.5),
            Err("Longitude must be between -180 and 180 degrees.")
        );
    }
}
