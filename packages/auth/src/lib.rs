#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Authentication for the `CrimeWatch` backend.
//!
//! [`password`] handles salted digests (with transparent upgrade of legacy
//! plaintext credentials), [`sessions`] issues and retires bearer tokens,
//! and [`verifier`] turns a presented token back into an
//! [`AuthenticatedUser`] through the [`verifier::TokenVerifier`] seam.
//! Role gates live here so handlers can express "admin only" in one line.

pub mod password;
pub mod sessions;
pub mod verifier;

use crimewatch_crime_models::{AccountStatus, UserRole};
use crimewatch_database_models::UserRow;
use thiserror::Error;

/// Errors surfaced while authenticating or authorizing a request.
///
/// Every variant carries a stable machine-readable [`code`](Self::code) and
/// an HTTP [`status`](Self::status) so the server layer can map failures
/// uniformly.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("Access token required")]
    NoToken,

    /// The token is unknown, expired, or was rejected upstream.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token resolved to an identity with no matching user row.
    #[error("User not found in system")]
    UserNotFound,

    /// The account exists but has been deactivated.
    #[error("Account is not active")]
    AccountInactive,

    /// A guard ran without an authenticated user attached.
    #[error("Authentication required")]
    NotAuthenticated,

    /// The authenticated user lacks the required role.
    #[error("{message}")]
    InsufficientPermissions {
        /// Which role the rejected endpoint requires.
        message: &'static str,
    },

    /// Verifier configuration problem (startup only).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// A database lookup failed mid-verification.
    #[error(transparent)]
    Database(#[from] crimewatch_database::DbError),
}

impl AuthError {
    /// Stable machine-readable failure code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InsufficientPermissions { .. } => "INSUFFICIENT_PERMISSIONS",
            Self::Config { .. } | Self::Database(_) => "AUTH_SERVICE_ERROR",
        }
    }

    /// HTTP status code this failure maps to.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::NoToken | Self::InvalidToken | Self::UserNotFound | Self::NotAuthenticated => {
                401
            }
            Self::AccountInactive | Self::InsufficientPermissions { .. } => 403,
            Self::Config { .. } | Self::Database(_) => 500,
        }
    }
}

/// The identity a verified token resolves to.
///
/// Carries only the fields handlers need for authorization and display,
/// never the stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User primary key.
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Account role.
    pub role: UserRole,
    /// Account status at verification time.
    pub status: AccountStatus,
}

impl From<UserRow> for AuthenticatedUser {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            status: user.status,
        }
    }
}

/// Rejects everyone but admins.
///
/// # Errors
///
/// Returns [`AuthError::InsufficientPermissions`] for non-admin roles.
pub const fn require_admin(user: &AuthenticatedUser) -> Result<(), AuthError> {
    match user.role {
        UserRole::Admin => Ok(()),
        UserRole::Manager => Err(AuthError::InsufficientPermissions {
            message: "Admin access required",
        }),
    }
}

/// Rejects everyone but active managers.
///
/// Deactivation can land between login and a later request, so the status
/// is checked again here rather than trusting the session.
///
/// # Errors
///
/// Returns [`AuthError::InsufficientPermissions`] for non-manager roles and
/// [`AuthError::AccountInactive`] for deactivated manager accounts.
pub const fn require_manager(user: &AuthenticatedUser) -> Result<(), AuthError> {
    match user.role {
        UserRole::Manager => {
            if user.status.is_active() {
                Ok(())
            } else {
                Err(AuthError::AccountInactive)
            }
        }
        UserRole::Admin => Err(AuthError::InsufficientPermissions {
            message: "Manager access required",
        }),
    }
}
