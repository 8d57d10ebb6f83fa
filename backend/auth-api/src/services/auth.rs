//! Registration and login orchestration.
//!
//! The service owns no state of its own: repositories, the hasher and the
//! token service are injected, and every invariant that has to survive
//! concurrent requests is enforced by the store.

use crate::db::{FailedAttemptRepository, SessionRepository, UserRepository};
use crate::error::{AuthError, Result};
use crate::models::{Credentials, NewUser, RegisterUser, UserProfile};
use crate::security::{Claims, PasswordHasher, TokenService};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

/// Successful login result.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Profile as it was before this login (previous `last_login`/`last_ip`).
    pub user: UserProfile,
    /// Signed access token for the new session.
    pub token: String,
}

/// Result of checking a token; never an error.
#[derive(Debug, Clone)]
pub struct TokenCheck {
    pub success: bool,
    pub claims: Option<Claims>,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    failed_attempts: Arc<dyn FailedAttemptRepository>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    /// Verified against on unknown usernames so both failures cost a bcrypt run
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        failed_attempts: Arc<dyn FailedAttemptRepository>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Result<Self> {
        let dummy_hash = hasher.hash("no-such-user")?;

        Ok(Self {
            users,
            sessions,
            failed_attempts,
            hasher,
            tokens,
            dummy_hash,
        })
    }

    /// Register a new account and return it without the password hash.
    pub async fn create_user(&self, input: RegisterUser, ip: &str) -> Result<UserProfile> {
        input.validate()?;

        if self
            .users
            .find_by_username_or_email(&input.username, &input.email)
            .await?
            .is_some()
        {
            tracing::warn!(username = %input.username, ip, "Registration rejected: already registered");
            return Err(AuthError::AlreadyRegistered);
        }

        let password_hash = self.hash_password(input.password).await?;

        // A concurrent registration can still win the unique index; the
        // repository maps that to AlreadyRegistered as well.
        let user = self
            .users
            .insert(NewUser {
                username: input.username,
                email: input.email,
                password_hash,
                role_id: input.role_id,
                last_ip: ip.to_string(),
            })
            .await?;

        tracing::info!(user_id = user.id, ip, "User registered");
        Ok(user.into())
    }

    /// Verify credentials, enforce the single-active-session rule and open
    /// or refresh the caller's session.
    pub async fn login_user(&self, credentials: Credentials, ip: &str) -> Result<LoginOutcome> {
        let Some(user) = self.users.find_by_username(&credentials.username).await? else {
            self.verify_password(credentials.password, self.dummy_hash.clone())
                .await?;
            self.failed_attempts.record_failure(None, ip).await?;
            tracing::warn!(ip, "Login failed: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        let valid = self
            .verify_password(credentials.password, user.password_hash.clone())
            .await?;
        if !valid {
            self.failed_attempts.record_failure(Some(user.id), ip).await?;
            tracing::warn!(user_id = user.id, ip, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(active) = self.sessions.find_active(user.id).await? {
            if active.ip != ip {
                tracing::warn!(
                    user_id = user.id,
                    ip,
                    active_ip = %active.ip,
                    "Login rejected: session active from another address"
                );
                return Err(AuthError::SessionConflict { user_id: user.id });
            }
        }

        let token = self.tokens.issue(&user)?;

        // Stamp the login before touching the session so a failure here
        // leaves no session holding a token the caller never received.
        self.users.record_login(user.id, ip, Utc::now()).await?;

        // Replace in place when the same-IP session is still there, open a
        // new one otherwise. The partial unique index turns a concurrent
        // insert into SessionConflict.
        if !self.sessions.replace_token(user.id, ip, &token).await? {
            self.sessions.insert_active(user.id, &token, ip).await?;
        }

        tracing::info!(user_id = user.id, ip, "User logged in");
        Ok(LoginOutcome {
            user: user.into(),
            token,
        })
    }

    /// Check a token's signature and expiry without touching storage.
    pub fn verify_token(&self, token: &str) -> TokenCheck {
        match self.tokens.verify(token) {
            Ok(claims) => TokenCheck {
                success: true,
                claims: Some(claims),
            },
            Err(err) => {
                tracing::debug!(error = %err, "Token verification failed");
                TokenCheck {
                    success: false,
                    claims: None,
                }
            }
        }
    }

    pub async fn find_user(&self, id: i32) -> Result<Option<UserProfile>> {
        Ok(self.users.find_by_id(id).await?.map(UserProfile::from))
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, digest: String) -> Result<bool> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?
    }
}
