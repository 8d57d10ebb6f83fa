//! Per-request caller identity.
//!
//! Built once per inbound GraphQL request from the operation name, the raw
//! `Authorization` header and the client address, then attached to the
//! query as context data.

use crate::error::{AuthError, Result};
use crate::security::{Claims, TokenService};
use std::sync::Arc;

/// Operations that run without a token
pub const PUBLIC_OPERATIONS: [&str; 4] =
    ["IntrospectionQuery", "RegisterUser", "LoginUser", "VerifyToken"];

#[derive(Debug, Clone)]
pub enum Caller {
    Anonymous,
    Authenticated { claims: Claims },
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub ip: String,
    pub caller: Caller,
}

impl RequestContext {
    pub fn anonymous(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            caller: Caller::Anonymous,
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        match &self.caller {
            Caller::Authenticated { claims } => Some(claims),
            Caller::Anonymous => None,
        }
    }
}

pub fn is_public_operation(operation_name: Option<&str>) -> bool {
    operation_name.is_some_and(|name| PUBLIC_OPERATIONS.contains(&name))
}

#[derive(Clone)]
pub struct RequestContextBuilder {
    tokens: Arc<TokenService>,
}

impl RequestContextBuilder {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Public operations get an anonymous context. Anything else needs a
    /// valid token in `authorization`, used as-is (no scheme prefix).
    pub fn build(
        &self,
        operation_name: Option<&str>,
        authorization: Option<&str>,
        ip: String,
    ) -> Result<RequestContext> {
        if is_public_operation(operation_name) {
            return Ok(RequestContext::anonymous(ip));
        }

        let token = authorization
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify(token).map_err(|err| {
            tracing::warn!(ip = %ip, error = %err, "Rejected request with invalid token");
            err
        })?;

        Ok(RequestContext {
            ip,
            caller: Caller::Authenticated { claims },
        })
    }
}

/// Pick the client address: first `x-forwarded-for` entry, else the peer.
pub fn client_ip(forwarded_for: Option<&str>, peer: Option<&str>) -> String {
    let raw = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or(peer)
        .unwrap_or_default();

    normalize_ip(raw)
}

/// `::1` becomes `127.0.0.1`; any other address with a `:` keeps only its
/// last non-empty segment (`::ffff:10.0.0.7` -> `10.0.0.7`).
pub fn normalize_ip(raw: &str) -> String {
    if raw == "::1" {
        return "127.0.0.1".to_string();
    }

    match raw.rsplit(':').next() {
        Some(last) if raw.contains(':') && !last.is_empty() => last.to_string(),
        _ => raw.to_string(),
    }
}
