/// Password hashing and strength rules
///
/// Hashes use Argon2id (64 MB memory, 3 iterations, 4 lanes). The parameters
/// are stored in the PHC string, so verification keeps working if they change.
///
/// # Example
///
/// ```
/// use gearloan_shared::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("Borrow2day").unwrap();
/// assert!(verify_password("Borrow2day", &hash).unwrap());
/// assert!(!verify_password("borrow2day", &hash).unwrap());
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use std::sync::OnceLock;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash
///
/// Returns `Ok(false)` for a wrong password and `Err` only when the hash
/// itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Hash checked on sign-in attempts for unknown emails
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    DUMMY_HASH
        .get_or_init(|| hash_password("gearloan-unknown-account").ok())
        .as_deref()
}

/// Spends the same argon2 work as [`verify_password`] without a stored hash
///
/// Sign-in calls this when the email is unknown so the response time does not
/// reveal which emails are registered.
pub fn verify_dummy_password(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

/// Rejects passwords that are too short or lack a letter or a digit
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters long");
    }

    if !password.chars().any(char::is_alphabetic) {
        return Err("Password must contain at least one letter");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_uses_argon2id_params() {
        let hash = hash_password("Borrow2day").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_salts_differ() {
        let first = hash_password("same_password1").unwrap();
        let second = hash_password("same_password1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_dummy_hash_is_stable() {
        let hash = dummy_hash().expect("Dummy hash should be generated");
        assert_eq!(dummy_hash(), Some(hash));
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("Borrow2day", hash).unwrap());

        verify_dummy_password("Borrow2day");
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password1").unwrap();

        assert!(verify_password("correct_password1", &hash).unwrap());
        assert!(!verify_password("wrong_password1", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("Borrow2day").is_ok());
        assert!(validate_password_strength("lab-kit-42").is_ok());

        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("nodigitshere").is_err());
        assert!(validate_password_strength("1234567890").is_err());
    }
}
