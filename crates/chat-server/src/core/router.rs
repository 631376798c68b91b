//! Core Router
//!
//! Every route except `/health` requires a bearer token.

use crate::core::middleware::mw_require_auth;
use crate::core::AppState;
use crate::handlers;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        // Chat
        .route(
            "/chat/conversations",
            get(handlers::list_conversations).post(handlers::get_or_create_conversation),
        )
        .route("/chat/messages", post(handlers::send_message))
        .route(
            "/chat/conversations/{id}/messages",
            get(handlers::get_messages),
        )
        .route("/chat/conversations/{id}/read", post(handlers::mark_as_read))
        .route("/chat/unread", get(handlers::get_unread_count))
        .route("/chat/search", get(handlers::search_messages))
        // Presence and typing
        .route("/presence", put(handlers::update_presence))
        .route("/presence/connections", get(handlers::get_connections_status))
        .route("/chat/conversations/{id}/typing", post(handlers::send_typing))
        // Connections
        .route(
            "/connections",
            get(handlers::list_connections).post(handlers::send_connection_request),
        )
        .route("/connections/pending", get(handlers::list_pending_requests))
        .route("/connections/{id}/accept", post(handlers::accept_connection))
        .route("/connections/{id}/reject", post(handlers::reject_connection))
        .route(
            "/connections/{id}",
            axum::routing::delete(handlers::remove_connection),
        )
        // Broker
        .route("/realtime/token", get(handlers::get_connection_token))
        .route_layer(middleware::from_fn_with_state(state.clone(), mw_require_auth));

    Router::new()
        .merge(protected)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK - Chat Server"
}
