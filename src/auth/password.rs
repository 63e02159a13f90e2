//! Password hashing for employee logins.
//!
//! Argon2 PHC strings are the only format written. Rows imported from the
//! previous system may still hold a plaintext password (accepted once, then
//! rehashed) or a bcrypt hash, which cannot be verified here and forces a
//! reset.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::ServiceError;

/// Outcome of checking a candidate password against the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Valid,
    /// Matched a legacy plaintext value; the caller should store a fresh hash.
    ValidNeedsRehash,
    Invalid,
    ResetRequired,
}

pub fn hash_password(plain: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

fn is_bcrypt(stored: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| stored.starts_with(prefix))
}

pub fn verify_password(stored: Option<&str>, candidate: &str) -> PasswordCheck {
    let stored = match stored {
        Some(s) if !s.is_empty() => s,
        _ => return PasswordCheck::Invalid,
    };

    if is_bcrypt(stored) {
        return PasswordCheck::ResetRequired;
    }

    if stored.starts_with("$argon2") {
        return match PasswordHash::new(stored) {
            Ok(parsed) => {
                if Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
                {
                    PasswordCheck::Valid
                } else {
                    PasswordCheck::Invalid
                }
            }
            Err(_) => PasswordCheck::Invalid,
        };
    }

    if stored == candidate {
        PasswordCheck::ValidNeedsRehash
    } else {
        PasswordCheck::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argon2_round_trip() {
        let hash = hash_password("cafe-2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert_eq!(verify_password(Some(&hash), "cafe-2024"), PasswordCheck::Valid);
        assert_eq!(verify_password(Some(&hash), "otra"), PasswordCheck::Invalid);
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("igual").unwrap();
        let b = hash_password("igual").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn legacy_plaintext_matches_once_and_asks_for_rehash() {
        assert_eq!(
            verify_password(Some("secreto"), "secreto"),
            PasswordCheck::ValidNeedsRehash
        );
        assert_eq!(verify_password(Some("secreto"), "otro"), PasswordCheck::Invalid);
    }

    #[test]
    fn bcrypt_hashes_require_reset() {
        let bcrypt = "$2b$12$KIXQJ7l8m1vYdY0yZ0xWcOe3bQ0s3y5f9k3c2lK1m8O6v0pQ1r2s.";
        assert_eq!(verify_password(Some(bcrypt), "anything"), PasswordCheck::ResetRequired);
    }

    #[test]
    fn missing_password_never_matches() {
        assert_eq!(verify_password(None, ""), PasswordCheck::Invalid);
        assert_eq!(verify_password(Some(""), ""), PasswordCheck::Invalid);
    }
}
