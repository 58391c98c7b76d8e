//! Password hashing behind the application port.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use docman_application::PasswordHasher;
use docman_core::{AppError, AppResult};

/// Argon2id adapter for the [`PasswordHasher`] port.
///
/// Parameter choices follow the OWASP password storage guidance for
/// Argon2id: 19 MiB of memory, two passes, a single lane.
#[derive(Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    /// Creates the hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn argon2() -> Argon2<'static> {
        let params = Params::new(19 * 1024, 2, 1, None).unwrap_or_else(|_| Params::default());
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Self::argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::Internal(format!("password hashing failed: {error}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored password hash is malformed: {error}"))
        })?;

        match Self::argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use docman_application::PasswordHasher;

    use super::Argon2PasswordHasher;

    fn hash(hasher: &Argon2PasswordHasher, password: &str) -> String {
        match hasher.hash_password(password) {
            Ok(hash) => hash,
            Err(error) => panic!("hashing failed: {error}"),
        }
    }

    #[test]
    fn verification_accepts_the_original_password_only() {
        let hasher = Argon2PasswordHasher::new();
        let stored = hash(&hasher, "correct horse battery");

        assert!(matches!(
            hasher.verify_password("correct horse battery", &stored),
            Ok(true)
        ));
        assert!(matches!(
            hasher.verify_password("wrong horse battery", &stored),
            Ok(false)
        ));
    }

    #[test]
    fn salting_makes_repeated_hashes_distinct() {
        let hasher = Argon2PasswordHasher::new();
        assert_ne!(hash(&hasher, "same input"), hash(&hasher, "same input"));
    }

    #[test]
    fn malformed_stored_hash_is_an_error_not_a_mismatch() {
        let hasher = Argon2PasswordHasher::new();
        assert!(hasher.verify_password("anything", "not-a-phc-string").is_err());
    }
}
