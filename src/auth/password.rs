//! Doctor credential hashing
//!
//! Registration stores an Argon2id PHC string in place of the password; login
//! verifies the submitted password against it. The plaintext never reaches a
//! document or a log line.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::ClinicError;

/// Derive the stored credential for a new doctor account.
///
/// Each call draws a fresh salt, so registering the same password twice yields
/// unrelated PHC strings. Hashing happens here and nowhere else; stored
/// documents only ever carry the result.
pub fn hash_password(password: &str) -> Result<String, ClinicError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ClinicError::Internal(format!("Failed to hash password: {e}")))
}

/// Check a login attempt against the stored PHC string.
///
/// A wrong password is `Ok(false)`, not an error; only an unparseable stored
/// hash errors, since that means the doctor document itself is corrupt.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ClinicError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ClinicError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_stores_phc_not_plaintext() {
        let hash = hash_password("clinic-secret-9").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("clinic-secret-9"));
    }

    #[test]
    fn test_login_accepts_only_the_registered_password() {
        let hash = hash_password("clinic-secret-9").unwrap();

        assert!(verify_password("clinic-secret-9", &hash).unwrap());
        assert!(!verify_password("clinic-secret-8", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_repeat_registration_draws_a_fresh_salt() {
        let first = hash_password("shared-password").unwrap();
        let second = hash_password("shared-password").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("shared-password", &first).unwrap());
        assert!(verify_password("shared-password", &second).unwrap());
    }

    #[test]
    fn test_corrupt_stored_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("anything", "plaintext-left-by-mistake").is_err());
    }
}
