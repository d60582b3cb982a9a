//! Login and logout.

use actix_web::{HttpRequest, HttpResponse, web};
use crimewatch_auth::AuthError;
use crimewatch_auth::password::{hash_password, is_digest, verify_password};
use crimewatch_auth::sessions::{create_session, destroy_session};
use crimewatch_database::users;
use crimewatch_server_models::{ApiError, ApiUser, LoginRequest, LoginResponse};

use super::{auth_failure, non_empty, request_token};
use crate::AppState;

/// `POST /api/login`
///
/// Verifies the password against the stored digest, upgrading legacy
/// plaintext rows in place on a successful match, then opens a session
/// and returns its bearer token.
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> HttpResponse {
    let (Some(email), Some(password)) = (non_empty(&body.email), non_empty(&body.password)) else {
        return HttpResponse::BadRequest().json(ApiError::new("Email and password are required."));
    };

    let user = match users::find_user_by_email(state.db.as_ref(), email).await {
        Ok(Some(user)) => user,
        Ok(None) => return HttpResponse::Unauthorized().json(ApiError::new("Account not found.")),
        Err(e) => {
            log::error!("Failed to look up account for login: {e}");
            return HttpResponse::InternalServerError().json(ApiError::new("Server error."));
        }
    };

    let password_valid = if is_digest(&user.password_digest) {
        verify_password(password, &user.password_digest)
    } else if password == user.password_digest {
        // Legacy plaintext row; upgrade it now that the password is
        // known to be correct.
        let digest = hash_password(password);
        if let Err(e) = users::update_password(state.db.as_ref(), user.id, &digest).await {
            log::error!("Failed to upgrade legacy credential for user {}: {e}", user.id);
        }
        true
    } else {
        false
    };

    if !password_valid {
        return HttpResponse::Unauthorized().json(ApiError::new("Wrong password."));
    }

    let session = match create_session(state.db.as_ref(), user.id).await {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to create session for user {}: {e}", user.id);
            return HttpResponse::InternalServerError().json(ApiError::new("Server error."));
        }
    };

    if let Err(e) = users::update_last_login(state.db.as_ref(), user.id).await {
        log::warn!("Failed to record last login for user {}: {e}", user.id);
    }

    HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        token: session.token,
        user: ApiUser::from(user),
    })
}

/// `POST /api/logout`
///
/// Destroys the presented session. Succeeds even when the token was
/// already gone, so repeated logouts are harmless.
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let Some(token) = request_token(&req) else {
        return auth_failure(&AuthError::NoToken);
    };

    match destroy_session(state.db.as_ref(), token).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({"message": "Logout successful"})),
        Err(e) => {
            log::error!("Failed to destroy session: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Logout failed."))
        }
    }
}
