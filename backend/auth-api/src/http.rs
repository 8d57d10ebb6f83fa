//! HTTP surface: GraphQL endpoint, GraphiQL, SDL and health check

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use async_graphql::http::GraphiQLSource;
use async_graphql::{ErrorExtensions, Pos};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};

use crate::context::{client_ip, RequestContextBuilder};
use crate::schema::AppSchema;

/// Shared state for the GraphQL handlers
#[derive(Clone)]
pub struct AppState {
    pub schema: AppSchema,
    pub contexts: RequestContextBuilder,
}

/// Register the service routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/graphql", web::post().to(graphql_handler))
        .route("/graphql", web::get().to(graphiql_handler))
        .route("/graphql/schema", web::get().to(schema_handler))
        .route("/health", web::get().to(health_handler));
}

async fn graphql_handler(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = req.into_inner();

    let headers = http_req.headers();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());
    let peer = http_req.peer_addr().map(|addr| addr.ip().to_string());
    let ip = client_ip(forwarded_for, peer.as_deref());

    let context = state
        .contexts
        .build(request.operation_name.as_deref(), authorization, ip);

    match context {
        Ok(context) => state.schema.execute(request.data(context)).await.into(),
        // Rejected before any resolver runs
        Err(err) => async_graphql::Response::from_errors(vec![err
            .extend()
            .into_server_error(Pos::default())])
        .into(),
    }
}

async fn graphiql_handler() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn schema_handler(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(state.schema.sdl())
}

async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
