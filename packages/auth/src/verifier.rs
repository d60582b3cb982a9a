//! Token verification seam.
//!
//! Two implementations sit behind [`TokenVerifier`]: [`SessionVerifier`]
//! resolves tokens against the first-party `sessions` table, and
//! [`RemoteVerifier`] defers to a hosted auth service and then maps the
//! remote identity onto a local user row by email. Which one runs is
//! selected once at startup by [`create_verifier_from_env`].

use std::time::Duration;

use chrono::Utc;
use crimewatch_database::{sessions as session_queries, users as user_queries};
use serde::Deserialize;
use switchy_database::Database;

use crate::{AuthError, AuthenticatedUser, sessions};

/// Per-request timeout for the remote auth service.
const REMOTE_TIMEOUT_SECONDS: u64 = 10;

/// Resolves a bearer token into an authenticated user.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a token and load the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for unknown, expired, or
    /// upstream-rejected tokens, [`AuthError::UserNotFound`] when the
    /// identity has no local user row, and [`AuthError::AccountInactive`]
    /// for deactivated accounts.
    async fn verify(
        &self,
        db: &dyn Database,
        token: &str,
    ) -> Result<AuthenticatedUser, AuthError>;
}

/// Extracts the token from an `Authorization` header value.
///
/// Returns `None` unless the value uses the `Bearer` scheme and carries a
/// non-empty token.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// First-party verifier backed by the `sessions` table.
///
/// Stale rows found during lookup are deleted on the spot, so the table
/// self-cleans even between sweeper runs.
pub struct SessionVerifier;

#[async_trait::async_trait]
impl TokenVerifier for SessionVerifier {
    async fn verify(
        &self,
        db: &dyn Database,
        token: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let Some(session) = session_queries::get_session(db, token).await? else {
            return Err(AuthError::InvalidToken);
        };

        if sessions::is_expired(&session, Utc::now()) {
            if let Err(error) = session_queries::delete_session(db, &session.token).await {
                log::warn!("Failed to drop expired session: {error}");
            }
            return Err(AuthError::InvalidToken);
        }

        let Some(user) = user_queries::get_user(db, session.user_id).await? else {
            return Err(AuthError::UserNotFound);
        };

        if !user.status.is_active() {
            return Err(AuthError::AccountInactive);
        }

        Ok(user.into())
    }
}

/// Verifier that defers token checks to a hosted auth service.
///
/// The remote service answers `GET {base_url}/auth/v1/user` with the
/// identity behind the bearer token; authorization data still comes from
/// the local user row matched by email.
pub struct RemoteVerifier {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteVerifier {
    /// Creates a verifier pointed at a remote auth service.
    ///
    /// `api_key` is the service's project key, sent as an `apikey` header
    /// when present; the per-request bearer token rides separately.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct RemoteIdentity {
    email: Option<String>,
}

#[async_trait::async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(
        &self,
        db: &dyn Database,
        token: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url.trim_end_matches('/'));

        let mut request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECONDS));
        if let Some(api_key) = &self.api_key {
            request = request.header("apikey", api_key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                log::warn!("Remote token verification failed: {error}");
                return Err(AuthError::InvalidToken);
            }
        };

        if !response.status().is_success() {
            return Err(AuthError::InvalidToken);
        }

        let identity: RemoteIdentity = match response.json().await {
            Ok(identity) => identity,
            Err(error) => {
                log::warn!("Remote auth service returned an unreadable body: {error}");
                return Err(AuthError::InvalidToken);
            }
        };

        let Some(email) = identity.email.filter(|email| !email.is_empty()) else {
            return Err(AuthError::InvalidToken);
        };

        let Some(user) = user_queries::find_user_by_email(db, &email).await? else {
            return Err(AuthError::UserNotFound);
        };

        if !user.status.is_active() {
            return Err(AuthError::AccountInactive);
        }

        Ok(user.into())
    }
}

/// Creates a token verifier based on environment variables.
///
/// `AUTH_PROVIDER` selects the implementation:
///
/// 1. `session` (or unset) -> [`SessionVerifier`]
/// 2. `remote` -> [`RemoteVerifier`] at `AUTH_API_URL`, with the optional
///    `AUTH_API_KEY` project key
///
/// # Errors
///
/// Returns [`AuthError::Config`] for an unknown `AUTH_PROVIDER` value or a
/// missing `AUTH_API_URL`.
pub fn create_verifier_from_env() -> Result<Box<dyn TokenVerifier>, AuthError> {
    let provider = std::env::var("AUTH_PROVIDER").unwrap_or_else(|_| "session".to_string());

    match provider.as_str() {
        "session" => {
            log::info!("Using first-party session token verifier");
            Ok(Box::new(SessionVerifier))
        }
        "remote" => {
            let base_url = std::env::var("AUTH_API_URL").map_err(|_| AuthError::Config {
                message: "AUTH_API_URL must be set when AUTH_PROVIDER=remote".to_string(),
            })?;
            let api_key = std::env::var("AUTH_API_KEY").ok();
            log::info!("Using remote token verifier at {base_url}");
            Ok(Box::new(RemoteVerifier::new(base_url, api_key)))
        }
        other => Err(AuthError::Config {
            message: format!("Unknown AUTH_PROVIDER '{other}'. Valid values: session, remote"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_strips_the_scheme() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer   abc123  "), Some("abc123"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token("bearer abc123"), None);
        assert_eq!(bearer_token("abc123"), None);
    }

    #[test]
    fn bearer_token_rejects_empty_tokens() {
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer    "), None);
    }
}
