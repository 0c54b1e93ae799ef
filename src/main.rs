//! Bookery Backend - GraphQL book catalog service
//!
//! This is the main entry point for the Bookery backend API.
//! All operations are exposed via GraphQL at /graphql.

mod api;
mod config;
mod db;
mod errors;
mod graphql;

use std::net::SocketAddr;
use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::Router;
use axum::extract::WebSocketUpgrade;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::graphql::{CatalogSchema, CurrentUser, EventBus, extract_bearer, verify_token};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub schema: CatalogSchema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookery=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bookery Backend");
    if config.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET is not set; login will be unavailable");
    }

    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connected");

    let bus = EventBus::new();
    let schema = graphql::build_schema(db.clone(), bus, config.clone());
    tracing::info!("GraphQL schema built");

    let state = AppState {
        config: config.clone(),
        db,
        schema,
    };

    // Build router - GraphQL is the primary API
    let app = Router::new()
        // Health endpoints (no auth required)
        .merge(api::health::router())
        // Stored image bytes
        .merge(api::images::router())
        // GraphQL endpoint (handles all queries and mutations)
        .route("/graphql", get(graphiql).post(graphql_handler))
        // GraphQL WebSocket endpoint for subscriptions
        .route("/graphql/ws", get(graphql_ws_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Extract bearer token from Authorization header
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer)
        .map(|t| t.to_string())
}

/// Resolve a bearer token into the current user. Any failure along the way
/// (no secret, bad signature, expired token, user since deleted) yields an
/// anonymous context rather than a transport error.
async fn resolve_user(state: &AppState, token: &str) -> Option<CurrentUser> {
    let secret = state.config.jwt_secret.as_deref()?;
    let claims = verify_token(secret, token).ok()?;
    let user = state.db.users().get_by_id(&claims.id).await.ok()??;
    Some(CurrentUser {
        id: user.id,
        username: user.username,
        favorite_genre: user.favorite_genre,
    })
}

/// GraphQL query/mutation handler with auth context
async fn graphql_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    if let Some(token) = extract_token(&headers)
        && let Some(user) = resolve_user(&state, &token).await
    {
        request = request.data(user);
    }

    state.schema.execute(request).await.into()
}

/// GraphiQL interactive playground (only for browsers)
async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    // Check if this is a browser request (accepts HTML)
    let accepts_html = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        axum::response::Html(
            GraphiQLSource::build()
                .endpoint("/graphql")
                .subscription_endpoint("/graphql/ws")
                .finish(),
        )
        .into_response()
    } else {
        // Return a helpful JSON error for non-browser requests
        (
            axum::http::StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}

/// GraphQL WebSocket handler for subscriptions with auth
async fn graphql_ws_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
    headers: HeaderMap,
    protocol: async_graphql_axum::GraphQLProtocol,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    // Extract auth from headers for initial connection
    let header_user = match extract_token(&headers) {
        Some(token) => resolve_user(&state, &token).await,
        None => None,
    };

    ws.protocols(["graphql-transport-ws", "graphql-ws"])
        .on_upgrade(move |socket| {
            let mut gql_ws = async_graphql_axum::GraphQLWebSocket::new(
                socket,
                state.schema.clone(),
                protocol,
            );

            if let Some(user) = header_user {
                let mut data = async_graphql::Data::default();
                data.insert(user);
                gql_ws = gql_ws.with_data(data);
            }

            // Handle connection_init for auth via payload
            let init_state = state.clone();
            gql_ws
                .on_connection_init(move |params| async move {
                    if let Some(raw) = params
                        .get("Authorization")
                        .or_else(|| params.get("authorization"))
                        .and_then(|v| v.as_str())
                    {
                        let token = extract_bearer(raw).unwrap_or(raw);
                        if let Some(user) = resolve_user(&init_state, token).await {
                            let mut data = async_graphql::Data::default();
                            data.insert(user);
                            return Ok(data);
                        }
                    }
                    Ok(async_graphql::Data::default())
                })
                .serve()
        })
}
