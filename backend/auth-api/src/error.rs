use async_graphql::ErrorExtensions;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Message shared by every credential failure so callers cannot tell an
/// unknown username from a wrong password.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect username or password";

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    SessionConflict,
    Internal,
}

impl ErrorKind {
    /// Stable code exposed in the GraphQL error `extensions`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Authentication => "AUTHENTICATION_ERROR",
            ErrorKind::SessionConflict => "SESSION_CONFLICT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username or email is already registered")]
    AlreadyRegistered,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("User is not authenticated")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("A session is already active for user {user_id}")]
    SessionConflict { user_id: i32 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AlreadyRegistered | AuthError::InvalidInput(_) => ErrorKind::Validation,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::TokenExpired => ErrorKind::Authentication,
            AuthError::SessionConflict { .. } => ErrorKind::SessionConflict,
            AuthError::Database(_) | AuthError::JwtError(_) | AuthError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidToken(_) | AuthError::TokenExpired => {
                "Invalid or expired token".to_string()
            }
            AuthError::SessionConflict { .. } => "A session is already active".to_string(),
            AuthError::Database(_) | AuthError::JwtError(_) | AuthError::Internal(_) => {
                // Don't leak internal details
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ErrorExtensions for AuthError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.public_message())
            .extend_with(|_, e| e.set("code", self.kind().code()))
    }
}

// Conversions from external error types
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        AuthError::Internal(format!("password hashing failed: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_message() {
        assert_eq!(
            AuthError::InvalidCredentials.public_message(),
            INVALID_CREDENTIALS_MESSAGE
        );
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err = AuthError::Database("relation \"users\" does not exist".to_string());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_graphql_extension_carries_code() {
        let err = AuthError::SessionConflict { user_id: 7 }.extend();
        assert_eq!(err.message, "A session is already active");

        let code = err
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("SESSION_CONFLICT")));
    }
}
