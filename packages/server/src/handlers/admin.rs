//! Admin-only management endpoints: manager accounts, monitored
//! locations, crime reports, and the analysis cache.

use actix_web::{HttpRequest, HttpResponse, web};
use crimewatch_auth::password::hash_password;
use crimewatch_crime_models::{AccountStatus, LocationStatus, UserRole};
use crimewatch_database::{crimes, locations, users};
use crimewatch_database_models::{
    LocationUpdate, ManagerUpdate, NewCrime, NewLocation, NewManager,
};
use crimewatch_ingest::{parse_crimes_csv, parse_locations_csv, parse_timestamp};
use crimewatch_server_models::{
    ApiCrime, ApiCrimeWithLocation, ApiData, ApiError, ApiLocation, ApiManagerAccount, ApiMessage,
    ApiMutation, ImportCounts, LocationPayload, NewCrimeRequest, RegisterManagerRequest,
    RegisteredManager, StatusUpdateRequest, UpdateManagerRequest, UsersResponse,
};

use super::{admin_guard, auth_failure, non_empty, validate_coordinates};
use crate::AppState;

/// `POST /api/admin/register-manager`
///
/// Creates a manager account and its profile row. When coordinates are
/// supplied a Google Maps URL is generated and stored alongside them.
pub async fn register_manager(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<RegisterManagerRequest>,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    let (Some(email), Some(password), Some(name), Some(organization)) = (
        non_empty(&body.email),
        non_empty(&body.password),
        non_empty(&body.name),
        non_empty(&body.organization),
    ) else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "Email, password, name, and organization are required.",
        ));
    };

    let coordinates = match (body.latitude, body.longitude) {
        (Some(latitude), Some(longitude)) => Some((latitude, longitude)),
        (None, None) => None,
        _ => {
            return HttpResponse::BadRequest().json(ApiError::new(
                "Latitude and longitude must be provided together.",
            ));
        }
    };
    if let Some((latitude, longitude)) = coordinates {
        if let Err(message) = validate_coordinates(latitude, longitude) {
            return HttpResponse::BadRequest().json(ApiError::new(message));
        }
    }

    match users::find_user_by_email(state.db.as_ref(), email).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(ApiError::new("Email is already registered."));
        }
        Err(e) => {
            log::error!("Failed to check for an existing account: {e}");
            return HttpResponse::InternalServerError().json(ApiError::new("Server error."));
        }
    }

    let map_url = coordinates
        .map(|(latitude, longitude)| format!("https://maps.google.com/@{latitude},{longitude}"));
    let manager = NewManager {
        email: email.to_string(),
        password_digest: hash_password(password),
        name: name.to_string(),
        organization: organization.to_string(),
        map_url,
        latitude: coordinates.map(|(latitude, _)| latitude),
        longitude: coordinates.map(|(_, longitude)| longitude),
    };

    match users::insert_manager(state.db.as_ref(), &manager).await {
        Ok(id) => HttpResponse::Created().json(ApiMutation::new(
            "Manager registered successfully.",
            RegisteredManager {
                id,
                email: manager.email,
                name: manager.name,
                role: UserRole::Manager,
                status: AccountStatus::Active,
                organization: manager.organization,
                map_url: manager.map_url,
                latitude: manager.latitude,
                longitude: manager.longitude,
            },
        )),
        Err(e) => {
            log::error!("Failed to register manager: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to register manager."))
        }
    }
}

/// `GET /api/admin/users`
pub async fn list_users(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    match users::list_managers(state.db.as_ref()).await {
        Ok(rows) => HttpResponse::Ok().json(UsersResponse {
            success: true,
            users: rows.into_iter().map(ApiManagerAccount::from).collect(),
        }),
        Err(e) => {
            log::error!("Failed to list manager accounts: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to fetch user data."))
        }
    }
}

/// `PATCH /api/admin/users/{id}`
///
/// Updates the account row and its manager profile together. The
/// `location` field carries the profile map URL.
pub async fn update_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateManagerRequest>,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    let user_id = path.into_inner();
    let (Some(name), Some(email)) = (non_empty(&body.name), non_empty(&body.email)) else {
        return HttpResponse::BadRequest().json(ApiError::new("Name and email are required."));
    };

    let update = ManagerUpdate {
        name: name.to_string(),
        email: email.to_string(),
        organization: body.organization.clone(),
        map_url: body.location.clone(),
    };

    match users::update_manager(state.db.as_ref(), user_id, &update).await {
        Ok(0) => HttpResponse::NotFound().json(ApiError::new("User not found.")),
        Ok(_) => HttpResponse::Ok().json(ApiMessage::new("Manager details updated.")),
        Err(e) => {
            log::error!("Failed to update manager {user_id}: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to update manager details."))
        }
    }
}

/// `PATCH /api/admin/users/{id}/status`
///
/// Admins cannot deactivate their own account.
pub async fn set_user_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
) -> HttpResponse {
    let admin = match admin_guard(&state, &req).await {
        Ok(user) => user,
        Err(e) => return auth_failure(&e),
    };

    let user_id = path.into_inner();
    let Some(status) = parse_status::<AccountStatus>(body.status.as_deref()) else {
        return HttpResponse::BadRequest()
            .json(ApiError::new("Invalid status. Use 'active' or 'inactive'."));
    };

    if admin.id == user_id && status == AccountStatus::Inactive {
        return HttpResponse::Forbidden()
            .json(ApiError::new("Admins cannot deactivate their own account."));
    }

    match users::set_user_status(state.db.as_ref(), user_id, status).await {
        Ok(0) => HttpResponse::NotFound().json(ApiError::new("User not found.")),
        Ok(_) => HttpResponse::Ok().json(ApiMessage::new(format!(
            "User {user_id} status changed to {status}."
        ))),
        Err(e) => {
            log::error!("Failed to update status for user {user_id}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Server error."))
        }
    }
}

/// `GET /api/admin/locations`
pub async fn list_locations(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    match locations::list_locations(state.db.as_ref()).await {
        Ok(rows) => {
            let data: Vec<ApiLocation> = rows.into_iter().map(ApiLocation::from).collect();
            HttpResponse::Ok().json(ApiData::new(data))
        }
        Err(e) => {
            log::error!("Failed to list locations: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to fetch location data."))
        }
    }
}

/// `POST /api/admin/locations`
pub async fn create_location(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<LocationPayload>,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    let location = match location_input(&body) {
        Ok(location) => location,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    match locations::insert_location(state.db.as_ref(), &location).await {
        Ok(id) => HttpResponse::Created().json(ApiMutation::new(
            "Location added successfully.",
            ApiLocation {
                id,
                name: location.name,
                latitude: location.latitude,
                longitude: location.longitude,
                map_url: location.map_url,
                status: LocationStatus::Active,
            },
        )),
        Err(e) => {
            log::error!("Failed to add location: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to add location."))
        }
    }
}

/// `PATCH /api/admin/locations/{id}`
pub async fn update_location(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<LocationPayload>,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    let id = path.into_inner();
    let input = match location_input(&body) {
        Ok(input) => input,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };
    let update = LocationUpdate {
        name: input.name,
        latitude: input.latitude,
        longitude: input.longitude,
        map_url: input.map_url,
    };

    match locations::update_location(state.db.as_ref(), id, &update).await {
        Ok(0) => HttpResponse::NotFound().json(ApiError::new("Location not found.")),
        Ok(_) => HttpResponse::Ok().json(ApiMessage::new("Location updated.")),
        Err(e) => {
            log::error!("Failed to update location {id}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to update location."))
        }
    }
}

/// `DELETE /api/admin/locations/{id}`
///
/// Refused while crime reports still reference the location.
pub async fn delete_location(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    let id = path.into_inner();
    let count = match crimes::count_for_location(state.db.as_ref(), id).await {
        Ok(count) => count,
        Err(e) => {
            log::error!("Failed to count crimes for location {id}: {e}");
            return HttpResponse::InternalServerError().json(ApiError::new("Server error."));
        }
    };
    if count > 0 {
        return HttpResponse::BadRequest().json(ApiError::new(format!(
            "Cannot delete this location. {count} crime reports still reference it."
        )));
    }

    match locations::delete_location(state.db.as_ref(), id).await {
        Ok(0) => HttpResponse::NotFound().json(ApiError::new("Location not found.")),
        Ok(_) => HttpResponse::Ok().json(ApiMessage::new("Location deleted.")),
        Err(e) => {
            log::error!("Failed to delete location {id}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to delete location."))
        }
    }
}

/// `PATCH /api/admin/locations/{id}/status`
pub async fn set_location_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    let id = path.into_inner();
    let Some(status) = parse_status::<LocationStatus>(body.status.as_deref()) else {
        return HttpResponse::BadRequest()
            .json(ApiError::new("Invalid status. Use 'active' or 'inactive'."));
    };

    match locations::set_location_status(state.db.as_ref(), id, status).await {
        Ok(0) => HttpResponse::NotFound().json(ApiError::new("Location not found.")),
        Ok(_) => HttpResponse::Ok().json(ApiMessage::new(format!(
            "Location {id} status changed to {status}."
        ))),
        Err(e) => {
            log::error!("Failed to update status for location {id}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Server error."))
        }
    }
}

/// `POST /api/admin/locations/import`
///
/// Body is the raw CSV file. Invalid rows are skipped and counted.
pub async fn import_locations(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    if body.is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("CSV file not found."));
    }

    let import = match parse_locations_csv(&body) {
        Ok(import) => import,
        Err(e) => {
            return HttpResponse::BadRequest()
                .json(ApiError::new(format!("Could not read the CSV file: {e}")));
        }
    };
    if import.rows.is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiError::new("No valid location rows in the CSV file."));
    }

    match locations::insert_locations(state.db.as_ref(), &import.rows).await {
        Ok(imported) => HttpResponse::Ok().json(ApiMutation::new(
            format!("Location import complete. {imported} locations added."),
            ImportCounts {
                imported,
                skipped: import.skipped,
            },
        )),
        Err(e) => {
            log::error!("Failed to import locations: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to import location data."))
        }
    }
}

/// `GET /api/admin/crimes`
pub async fn list_crimes(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    match crimes::list_crimes_with_locations(state.db.as_ref()).await {
        Ok(rows) => {
            let data: Vec<ApiCrimeWithLocation> =
                rows.into_iter().map(ApiCrimeWithLocation::from).collect();
            HttpResponse::Ok().json(ApiData::new(data))
        }
        Err(e) => {
            log::error!("Failed to list crime reports: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to fetch crime data."))
        }
    }
}

/// `POST /api/admin/crimes`
pub async fn create_crime(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<NewCrimeRequest>,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    let (Some(location_id), Some(category), Some(occurred_text)) = (
        body.location_id,
        non_empty(&body.category),
        non_empty(&body.occurred_at),
    ) else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "Fields location_id, category, and occurred_at are required.",
        ));
    };
    let Some(occurred_at) = parse_timestamp(occurred_text) else {
        return HttpResponse::BadRequest().json(ApiError::new(
            "occurred_at must be RFC 3339, YYYY-MM-DD HH:MM:SS, or YYYY-MM-DD.",
        ));
    };

    match locations::get_location(state.db.as_ref(), location_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::BadRequest()
                .json(ApiError::new("No location exists with that location_id."));
        }
        Err(e) => {
            log::error!("Failed to validate location {location_id}: {e}");
            return HttpResponse::InternalServerError().json(ApiError::new("Server error."));
        }
    }

    let crime = NewCrime {
        location_id,
        category: category.to_string(),
        occurred_at,
        description: body.description.clone(),
    };

    match crimes::insert_crime(state.db.as_ref(), &crime).await {
        Ok(id) => HttpResponse::Created().json(ApiMutation::new(
            "Crime report added.",
            ApiCrime {
                id,
                location_id,
                category: crime.category,
                occurred_at: crime.occurred_at,
                description: crime.description,
            },
        )),
        Err(e) => {
            log::error!("Failed to add crime report: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to add crime report."))
        }
    }
}

/// `POST /api/admin/crimes/import`
///
/// Body is the raw CSV file. Invalid rows are skipped and counted.
pub async fn import_crimes(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    if body.is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("CSV file not found."));
    }

    let import = match parse_crimes_csv(&body) {
        Ok(import) => import,
        Err(e) => {
            return HttpResponse::BadRequest()
                .json(ApiError::new(format!("Could not read the CSV file: {e}")));
        }
    };
    if import.rows.is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiError::new("No valid crime rows in the CSV file."));
    }

    match crimes::insert_crimes(state.db.as_ref(), &import.rows).await {
        Ok(imported) => HttpResponse::Ok().json(ApiMutation::new(
            format!("Crime import complete. {imported} reports added."),
            ImportCounts {
                imported,
                skipped: import.skipped,
            },
        )),
        Err(e) => {
            log::error!("Failed to import crime reports: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to import crime data."))
        }
    }
}

/// `GET /api/admin/cache/stats`
pub async fn cache_stats(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    HttpResponse::Ok().json(ApiData::new(state.cache.stats()))
}

/// `POST /api/admin/cache/clear`
pub async fn clear_cache(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(e) = admin_guard(&state, &req).await {
        return auth_failure(&e);
    }

    state.cache.clear();
    HttpResponse::Ok().json(ApiMessage::new("Analysis cache cleared."))
}

/// Parses a `"active"`/`"inactive"` status string.
fn parse_status<S: std::str::FromStr>(status: Option<&str>) -> Option<S> {
    status.and_then(|value| value.parse().ok())
}

/// Validates the location payload shared by create and update.
fn location_input(body: &LocationPayload) -> Result<NewLocation, &'static str> {
    let (Some(name), Some(latitude), Some(longitude), Some(map_url)) = (
        non_empty(&body.name),
        body.latitude,
        body.longitude,
        non_empty(&body.map_url),
    ) else {
        return Err("All fields (name, latitude, longitude, map_url) are required.");
    };
    validate_coordinates(latitude, longitude)?;

    Ok(NewLocation {
        name: name.to_string(),
        latitude,
        longitude,
        map_url: Some(map_url.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(
        name: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        map_url: Option<&str>,
    ) -> LocationPayload {
        LocationPayload {
            name: name.map(ToString::to_string),
            latitude,
            longitude,
            map_url: map_url.map(ToString::to_string),
        }
    }

    #[test]
    fn location_input_requires_every_field() {
        let body = payload(Some("Malioboro"), Some(-7.79), None, Some("https://maps.example"));
        assert_eq!(
            location_input(&body),
            Err("All fields (name, latitude, longitude, map_url) are required.")
        );
    }

    #[test]
    fn location_input_checks_coordinate_ranges() {
        let body = payload(Some("Malioboro"), Some(-97.79), Some(110.36), Some("https://m"));
        assert_eq!(
            location_input(&body),
            Err("Latitude must be between -90 and 90 degrees.")
        );
    }

    #[test]
    fn location_input_builds_the_insert_payload() {
        let body = payload(Some("Malioboro"), Some(-7.79), Some(110.36), Some("https://m"));
        let location = location_input(&body).unwrap();
        assert_eq!(location.name, "Malioboro");
        assert_eq!(location.map_url.as_deref(), Some("https://m"));
    }

    #[test]
    fn parse_status_rejects_unknown_values() {
        assert_eq!(
            parse_status::<AccountStatus>(Some("active")),
            Some(AccountStatus::Active)
        );
        assert_eq!(parse_status::<AccountStatus>(Some("suspended")), None);
        assert_eq!(parse_status::<AccountStatus>(None), None);
    }
}
