//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use bizdesk_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters")]
    InvalidLength,
    #[error("Hash error: {0}")]
    HashError(String),
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let len = password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
            return Err(PasswordError::InvalidLength);
        }
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("correct horse battery").unwrap();
        assert!(PasswordService::verify("correct horse battery", &hash).unwrap());
        assert!(!PasswordService::verify("wrong horse battery", &hash).unwrap());
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            PasswordService::hash("short"),
            Err(PasswordError::InvalidLength)
        ));
    }

    #[test]
    fn test_garbage_hash_is_error() {
        assert!(PasswordService::verify("whatever1", "not-a-phc-string").is_err());
    }
}
