/// Password hashing and verification using bcrypt
use crate::error::{AuthError, Result};
use crate::models::user::MAX_PASSWORD_BYTES;

/// bcrypt hasher with a configured cost factor.
///
/// Both operations are CPU bound; async callers should run them on the
/// blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password with a fresh random salt
    ///
    /// ## Returns
    ///
    /// Modular crypt string (`$2b$<cost>$...`) safe for database storage
    ///
    /// ## Errors
    ///
    /// `InvalidInput` when the password is longer than bcrypt's 72-byte input,
    /// since the tail would be silently dropped.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::InvalidInput(
                "password must be at most 72 bytes".to_string(),
            ));
        }
        bcrypt::hash(password, self.cost).map_err(AuthError::from)
    }

    /// Verify a password against its hash
    ///
    /// ## Returns
    ///
    /// `true` if password matches hash, `false` otherwise. Errors only when
    /// `digest` is not a bcrypt hash. Passwords over 72 bytes never match:
    /// bcrypt would compare only their prefix.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool> {
        let matched = bcrypt::verify(password, digest).map_err(AuthError::from)?;
        Ok(matched && password.len() <= MAX_PASSWORD_BYTES)
    }
}
