//! Password hashing capability.
//!
//! The concrete algorithm is an external capability as far as the session
//! core is concerned; callers depend on the [`PasswordHasher`] trait. The
//! bundled implementation uses Argon2id in PHC string format.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordVerifier};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash/verify capability consumed by the login flow.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// `Ok(true)` on match, `Ok(false)` on mismatch; an error only when the
    /// stored hash itself is unusable.
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id implementation of [`PasswordHasher`].
#[derive(Debug, Default, Clone)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        argon2::PasswordHasher::hash_password(&Argon2::default(), plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}
