//! Salted password digests.
//!
//! Stored credentials use the format `sha256$<salt>$<hex digest>`. Rows
//! that predate hashing hold the raw password instead; the login flow
//! detects those with [`is_digest`] and rewrites them through
//! [`hash_password`] on the first successful login.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Marker prefix shared by every stored digest.
pub const DIGEST_PREFIX: &str = "sha256$";

/// Hashes a password with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    hash_with_salt(password, &salt)
}

/// Whether a stored credential is already in digest format.
#[must_use]
pub fn is_digest(stored: &str) -> bool {
    stored.starts_with(DIGEST_PREFIX)
}

/// Checks a password attempt against a stored digest.
///
/// Returns `false` for credentials that are not in digest format; callers
/// handle the legacy plaintext comparison themselves.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some(rest) = stored.strip_prefix(DIGEST_PREFIX) else {
        return false;
    };
    let Some((salt, _)) = rest.split_once('$') else {
        return false;
    };

    hash_with_salt(password, salt) == stored
}

fn hash_with_salt(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();

    format!("{DIGEST_PREFIX}{salt}${digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_has_the_expected_shape() {
        let stored = hash_password("hunter2");

        let parts: Vec<&str> = stored.split('$').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "sha256");
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2].len(), 64);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        let first = hash_password("hunter2");
        let second = hash_password("hunter2");

        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let stored = hash_password("hunter2");
        assert!(!verify_password("hunter3", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn malformed_credentials_are_rejected() {
        assert!(!verify_password("hunter2", "hunter2"));
        assert!(!verify_password("hunter2", "sha256$"));
        assert!(!verify_password("hunter2", "sha256$saltonly"));
    }

    #[test]
    fn is_digest_detects_the_prefix() {
        assert!(is_digest(&hash_password("hunter2")));
        assert!(!is_digest("hunter2"));
        assert!(!is_digest("$2b$10$abcdefghijklmnopqrstuv"));
    }
}
