//! Unauthenticated endpoints: the heatmap, per-location statistics, the
//! recent-crimes feed, and the raw crime listing behind the map popups.

use actix_web::{HttpResponse, web};
use crimewatch_database::{crimes, locations};
use crimewatch_server_models::{
    ApiCrime, ApiData, ApiError, CrimeListParams, HeatmapPoint, HeatmapResponse,
    LocationStatsData, Pagination, RecentCrimeEntry, RecentCrimesParams, RecentCrimesResponse,
};

use crate::AppState;

/// Default page size for the recent-crimes feed.
const DEFAULT_RECENT_LIMIT: u32 = 10;

/// `GET /api/public/heatmap`
///
/// Active locations with their crime counts and rate bands, highest
/// count first.
pub async fn heatmap(state: web::Data<AppState>) -> HttpResponse {
    match locations::heatmap_counts(state.db.as_ref()).await {
        Ok(rows) => {
            let data: Vec<HeatmapPoint> = rows.into_iter().map(HeatmapPoint::from).collect();
            HttpResponse::Ok().json(HeatmapResponse {
                success: true,
                total: data.len(),
                data,
            })
        }
        Err(e) => {
            log::error!("Failed to build heatmap: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to fetch heatmap data."))
        }
    }
}

/// `GET /api/public/locations/{id}/stats`
pub async fn location_stats(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();

    match locations::location_stats(state.db.as_ref(), id).await {
        Ok(Some(row)) => HttpResponse::Ok().json(ApiData::new(LocationStatsData::from(row))),
        Ok(None) => HttpResponse::NotFound().json(ApiError::new("Location not found.")),
        Err(e) => {
            log::error!("Failed to fetch stats for location {id}: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to fetch location statistics."))
        }
    }
}

/// `GET /api/public/recent-crimes`
///
/// Newest-first crimes at active locations. `has_more` is inferred from
/// a full page rather than a separate count query.
pub async fn recent_crimes(
    state: web::Data<AppState>,
    params: web::Query<RecentCrimesParams>,
) -> HttpResponse {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    match crimes::recent_crimes(state.db.as_ref(), limit, offset).await {
        Ok(rows) => {
            let data: Vec<RecentCrimeEntry> =
                rows.into_iter().map(RecentCrimeEntry::from).collect();
            let has_more = data.len() == usize::try_from(limit).unwrap_or(usize::MAX);
            HttpResponse::Ok().json(RecentCrimesResponse {
                success: true,
                total: data.len(),
                pagination: Pagination {
                    limit,
                    offset,
                    has_more,
                },
                data,
            })
        }
        Err(e) => {
            log::error!("Failed to fetch recent crimes: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to fetch recent crimes."))
        }
    }
}

/// `GET /api/crimes?location_id=`
///
/// Raw crime rows for one location as a bare array, matching the map
/// popup's fetch contract.
pub async fn crimes_for_location(
    state: web::Data<AppState>,
    params: web::Query<CrimeListParams>,
) -> HttpResponse {
    let location_id = params
        .location_id
        .as_deref()
        .and_then(|value| value.trim().parse::<i64>().ok())
        // Id zero is never assigned; the frontend treats it as missing.
        .filter(|id| *id != 0);
    let Some(location_id) = location_id else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "Parameter location_id is required and must be numeric.",
        ));
    };

    match crimes::list_crimes(state.db.as_ref(), Some(location_id)).await {
        Ok(rows) => {
            let data: Vec<ApiCrime> = rows.into_iter().map(ApiCrime::from).collect();
            HttpResponse::Ok().json(data)
        }
        Err(e) => {
            log::error!("Failed to list crimes for location {location_id}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to fetch crime data."))
        }
    }
}
