//! Manager-facing endpoints: the nearby-crime analytics report, its
//! cheap summary variant, and the profile card.

use actix_web::{HttpRequest, HttpResponse, web};
use crimewatch_analytics::AnalyticsError;
use crimewatch_database::users;
use crimewatch_server_models::{ApiData, ApiError, ApiManagerProfile};

use super::{auth_failure, manager_guard};
use crate::AppState;

/// Maps an analytics pipeline failure to its HTTP response.
fn analytics_failure(error: &AnalyticsError) -> HttpResponse {
    match error {
        AnalyticsError::SubjectNotFound => {
            HttpResponse::NotFound().json(ApiError::new("Manager profile not found."))
        }
        AnalyticsError::MissingCoordinates => HttpResponse::BadRequest().json(ApiError::new(
            "Business coordinates are not valid. Store latitude and longitude or a usable \
             Google Maps URL for this account.",
        )),
        AnalyticsError::Database(e) => {
            log::error!("Analytics query failed: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to analyze crime data."))
        }
    }
}

/// `GET /api/manager/analytics`
///
/// The full nearby-crime report for the authenticated manager.
pub async fn analytics(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let manager = match manager_guard(&state, &req).await {
        Ok(user) => user,
        Err(e) => return auth_failure(&e),
    };

    match state
        .analytics
        .get_analytics(state.db.as_ref(), manager.id)
        .await
    {
        Ok(report) => HttpResponse::Ok().json(ApiData::new(report)),
        Err(e) => analytics_failure(&e),
    }
}

/// `GET /api/manager/analytics/summary`
///
/// The order-of-magnitude estimate, skipping aggregation and narrative
/// work entirely.
pub async fn quick_stats(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let manager = match manager_guard(&state, &req).await {
        Ok(user) => user,
        Err(e) => return auth_failure(&e),
    };

    match state
        .analytics
        .quick_stats(state.db.as_ref(), manager.id)
        .await
    {
        Ok(stats) => HttpResponse::Ok().json(ApiData::new(stats)),
        Err(e) => analytics_failure(&e),
    }
}

/// `GET /api/manager/profile`
pub async fn profile(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let manager = match manager_guard(&state, &req).await {
        Ok(user) => user,
        Err(e) => return auth_failure(&e),
    };

    match users::manager_profile(state.db.as_ref(), manager.id).await {
        Ok(Some(row)) => HttpResponse::Ok().json(ApiData::new(ApiManagerProfile::from(row))),
        Ok(None) => HttpResponse::NotFound().json(ApiError::new("Manager profile not found.")),
        Err(e) => {
            log::error!("Failed to fetch manager profile: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to fetch manager profile."))
        }
    }
}
