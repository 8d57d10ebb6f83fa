//! Authentication API
//!
//! GraphQL service for account registration, login with single active
//! session enforcement, and access token verification.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod schema;
pub mod security;
pub mod services;

pub use config::Settings;
pub use error::{AuthError, ErrorKind, Result};
