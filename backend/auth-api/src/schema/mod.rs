//! GraphQL schema

pub mod user;

use async_graphql::{Context, EmptySubscription, MergedObject, Schema};
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::AuthError;
use crate::security::Claims;
use crate::services::AuthService;

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(user::UserQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(user::UserMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(auth: Arc<AuthService>) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(auth)
    .finish()
}

pub(crate) fn auth_service<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<AuthService>> {
    ctx.data::<Arc<AuthService>>()
}

/// Per-request context attached by the HTTP handler
pub(crate) fn request_context<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a RequestContext> {
    ctx.data::<RequestContext>()
}

/// Verify the caller is authenticated and return their claims
pub(crate) fn require_auth<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Claims> {
    use async_graphql::ErrorExtensions;

    ctx.data_opt::<RequestContext>()
        .and_then(RequestContext::claims)
        .ok_or_else(|| AuthError::MissingToken.extend())
}
