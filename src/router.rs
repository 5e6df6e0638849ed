//! The HTTP server's routes. Each one adapts a real HTTP request into an [`Event`] for its handler.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    routing::any,
    Router,
};
use axum_macros::debug_handler;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    api::{Event, Response},
    services,
    store::postgres::PgStore,
};

/// State shared by every route.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The store every handler reads and writes.
    pub store: PgStore,
}

/// Builds the router serving every resource under `/api/`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth", any(auth))
        .route("/api/scripts", any(scripts))
        .route("/api/forum", any(forum))
        .route("/api/comments", any(comments))
        .fallback(|| async {
            Response::json(StatusCode::NOT_FOUND, &json!({ "error": "Not found" }))
        })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Converts the parts of an HTTP request into an [`Event`].
fn event(method: &Method, query: HashMap<String, String>, body: &Bytes) -> Event {
    Event {
        http_method: Some(method.as_str().to_owned()),
        body: (!body.is_empty()).then(|| String::from_utf8_lossy(body).into_owned()),
        query_string_parameters: Some(query),
    }
}

/// Serves `/api/auth`.
#[debug_handler]
async fn auth(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    services::auth::handler(&state.store, event(&method, query, &body)).await
}

/// Serves `/api/scripts`.
#[debug_handler]
async fn scripts(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    services::scripts::handler(&state.store, event(&method, query, &body)).await
}

/// Serves `/api/forum`.
#[debug_handler]
async fn forum(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    services::forum::handler(&state.store, event(&method, query, &body)).await
}

/// Serves `/api/comments`.
#[debug_handler]
async fn comments(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    services::comments::handler(&state.store, event(&method, query, &body)).await
}
