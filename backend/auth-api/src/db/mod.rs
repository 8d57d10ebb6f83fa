//! Typed repositories over the credential store.
//!
//! The traits are what the authentication workflow depends on; the `Pg*`
//! types implement them on top of a shared `PgPool`. Uniqueness and the
//! single-active-session rule live in the schema (see `migrations/`), so
//! every implementation must surface constraint violations through the
//! error variants documented on each method.

pub mod failed_attempts;
pub mod sessions;
pub mod users;

use crate::config::DatabaseSettings;
use crate::error::Result;
use crate::models::{FailedAttempt, NewUser, Session, User};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub use failed_attempts::PgFailedAttemptRepository;
pub use sessions::PgSessionRepository;
pub use users::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_username_or_email(&self, username: &str, email: &str)
        -> Result<Option<User>>;

    /// Fails with `AuthError::AlreadyRegistered` when the username or email
    /// is already taken.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn record_login(&self, user_id: i32, ip: &str, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_active(&self, user_id: i32) -> Result<Option<Session>>;

    /// Fails with `AuthError::SessionConflict` when the user already has an
    /// active session.
    async fn insert_active(&self, user_id: i32, token: &str, ip: &str) -> Result<Session>;

    /// Swap the token of the user's active session opened from `ip`.
    /// Returns `false` when no such session exists.
    async fn replace_token(&self, user_id: i32, ip: &str, token: &str) -> Result<bool>;
}

#[async_trait]
pub trait FailedAttemptRepository: Send + Sync {
    /// Insert the (user, ip) counter or increment it.
    async fn record_failure(&self, user_id: Option<i32>, ip: &str) -> Result<FailedAttempt>;

    async fn find(&self, user_id: Option<i32>, ip: &str) -> Result<Option<FailedAttempt>>;
}

/// Create the connection pool from settings
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .idle_timeout(Duration::from_secs(settings.idle_timeout))
        .acquire_timeout(Duration::from_secs(settings.connection_timeout))
        .connect(&settings.url)
        .await
        .context("Failed to connect to database")
}

/// Round-trip a trivial query so startup fails fast on a bad database
pub async fn check_connection(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .context("Database connectivity check failed")?;
    Ok(())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
