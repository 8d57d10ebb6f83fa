//! Shared test fixtures: in-memory repositories that enforce the same
//! constraints as the PostgreSQL schema.

#![allow(dead_code)]

use async_trait::async_trait;
use auth_api::db::{FailedAttemptRepository, SessionRepository, UserRepository};
use auth_api::error::{AuthError, Result};
use auth_api::models::{FailedAttempt, NewUser, Session, User};
use auth_api::security::{PasswordHasher, TokenService};
use auth_api::services::AuthService;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const IP_A: &str = "10.0.0.1";
pub const IP_B: &str = "10.0.0.2";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<Session>,
    failed_attempts: Vec<FailedAttempt>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// One store implements all three repositories
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_record_login: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Make every later `record_login` fail like a dropped connection
    pub fn fail_record_login(&self) {
        self.fail_record_login.store(true, Ordering::SeqCst);
    }

    pub fn users(&self) -> Vec<User> {
        self.tables.lock().unwrap().users.clone()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.tables.lock().unwrap().sessions.clone()
    }

    pub fn failed_attempts(&self) -> Vec<FailedAttempt> {
        self.tables.lock().unwrap().failed_attempts.clone()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AuthError::AlreadyRegistered);
        }

        let created = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role_id: user.role_id,
            last_ip: Some(user.last_ip),
            last_login: None,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn record_login(&self, user_id: i32, ip: &str, at: DateTime<Utc>) -> Result<()> {
        if self.fail_record_login.load(Ordering::SeqCst) {
            return Err(AuthError::Database("connection reset".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.last_login = Some(at);
            user.last_ip = Some(ip.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn find_active(&self, user_id: i32) -> Result<Option<Session>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.is_active)
            .cloned())
    }

    async fn insert_active(&self, user_id: i32, token: &str, ip: &str) -> Result<Session> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .sessions
            .iter()
            .any(|s| s.user_id == user_id && s.is_active)
        {
            return Err(AuthError::SessionConflict { user_id });
        }

        let session = Session {
            id: tables.next_id(),
            user_id,
            token: token.to_string(),
            ip: ip.to_string(),
            is_active: true,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn replace_token(&self, user_id: i32, ip: &str, token: &str) -> Result<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .sessions
            .iter_mut()
            .find(|s| s.user_id == user_id && s.is_active && s.ip == ip)
        {
            Some(session) => {
                session.token = token.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl FailedAttemptRepository for MemoryStore {
    async fn record_failure(&self, user_id: Option<i32>, ip: &str) -> Result<FailedAttempt> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables
            .failed_attempts
            .iter_mut()
            .find(|a| a.user_id == user_id && a.ip == ip)
        {
            existing.attempts += 1;
            return Ok(existing.clone());
        }

        let attempt = FailedAttempt {
            id: tables.next_id(),
            user_id,
            ip: ip.to_string(),
            attempts: 1,
        };
        tables.failed_attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn find(&self, user_id: Option<i32>, ip: &str) -> Result<Option<FailedAttempt>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .failed_attempts
            .iter()
            .find(|a| a.user_id == user_id && a.ip == ip)
            .cloned())
    }
}

pub fn token_service() -> Arc<TokenService> {
    Arc::new(TokenService::new(TEST_SECRET, Duration::hours(1)))
}

/// Service over a fresh store; bcrypt at its minimum cost
pub fn auth_service() -> (Arc<AuthService>, MemoryStore) {
    auth_service_with_cost(4)
}

pub fn auth_service_with_cost(cost: u32) -> (Arc<AuthService>, MemoryStore) {
    let store = MemoryStore::default();
    let service = AuthService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        PasswordHasher::new(cost),
        token_service(),
    )
    .unwrap();
    (Arc::new(service), store)
}
