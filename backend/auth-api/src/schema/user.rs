//! User registration, login and lookup resolvers

use async_graphql::{Context, ErrorExtensions, InputObject, Object, Result as GraphQLResult, SimpleObject};
use chrono::{DateTime, Utc};

use super::{auth_service, request_context, require_auth};
use crate::error::AuthError;
use crate::models::{Credentials, RegisterUser, UserProfile};
use crate::security::Claims;
use crate::services::{LoginOutcome, TokenCheck};

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "User", rename_fields = "snake_case")]
pub struct UserObject {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role_id: Option<i32>,
    pub last_ip: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserProfile> for UserObject {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role_id: user.role_id,
            last_ip: user.last_ip,
            last_login: user.last_login,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(rename_fields = "snake_case")]
pub struct LoginResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role_id: Option<i32>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_ip: Option<String>,
    pub token: String,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            id: outcome.user.id,
            username: outcome.user.username,
            email: outcome.user.email,
            role_id: outcome.user.role_id,
            last_login: outcome.user.last_login,
            last_ip: outcome.user.last_ip,
            token: outcome.token,
        }
    }
}

/// Identity carried by a verified token
#[derive(SimpleObject, Clone, Debug)]
pub struct TokenUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<Claims> for TokenUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username,
            email: claims.email,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct VerifyTokenResponse {
    pub success: bool,
    pub user: Option<TokenUser>,
}

impl From<TokenCheck> for VerifyTokenResponse {
    fn from(check: TokenCheck) -> Self {
        Self {
            success: check.success,
            user: check.claims.map(TokenUser::from),
        }
    }
}

#[derive(InputObject, Clone, Debug)]
#[graphql(rename_fields = "snake_case")]
pub struct UserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<i32>,
}

#[derive(InputObject, Clone, Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Look up a user by id; null when it does not exist
    async fn buscar_usuario_por_id(
        &self,
        ctx: &Context<'_>,
        id: i32,
    ) -> GraphQLResult<Option<UserObject>> {
        let claims = require_auth(ctx)?;
        tracing::debug!(caller_id = claims.id, user_id = id, "Looking up user");

        let user = auth_service(ctx)?
            .find_user(id)
            .await
            .map_err(|e| e.extend())?;

        Ok(user.map(UserObject::from))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn create_user(&self, ctx: &Context<'_>, input: UserInput) -> GraphQLResult<UserObject> {
        let request = request_context(ctx)?;

        let user = auth_service(ctx)?
            .create_user(
                RegisterUser {
                    username: input.username,
                    email: input.email,
                    password: input.password,
                    role_id: input.role_id,
                },
                &request.ip,
            )
            .await
            .map_err(|e| e.extend())?;

        Ok(user.into())
    }

    /// `loginInput` is nullable to match existing clients; a missing value
    /// is a validation error.
    async fn login_user(
        &self,
        ctx: &Context<'_>,
        login_input: Option<LoginInput>,
    ) -> GraphQLResult<LoginResponse> {
        let request = request_context(ctx)?;
        let input = login_input
            .ok_or_else(|| AuthError::InvalidInput("loginInput is required".to_string()).extend())?;

        let outcome = auth_service(ctx)?
            .login_user(
                Credentials {
                    username: input.username,
                    password: input.password,
                },
                &request.ip,
            )
            .await
            .map_err(|e| e.extend())?;

        Ok(outcome.into())
    }

    async fn verify_token(&self, ctx: &Context<'_>, token: String) -> GraphQLResult<VerifyTokenResponse> {
        Ok(auth_service(ctx)?.verify_token(&token).into())
    }
}
