// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. All collaborators are
//! constructed once at startup and passed in; nothing is resolved at
//! request time.

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use taskpilot_agent::TurnRunner;
use taskpilot_config::model::GatewayConfig;
use taskpilot_core::{AuthAdapter, ConversationStore, TaskpilotError};

use crate::auth::auth_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Verifies bearer credentials into user identities.
    pub auth: Arc<dyn AuthAdapter>,
    /// Conversation and message persistence.
    pub conversations: Arc<dyn ConversationStore>,
    /// Runs conversational turns.
    pub runner: Arc<dyn TurnRunner>,
}

/// Builds the gateway router over the given state.
///
/// - `POST /users/{user_id}/chat` (bearer auth)
/// - `GET /health` (public)
pub fn build_router(state: GatewayState) -> Router {
    let api_routes = Router::new()
        .route("/users/{user_id}/chat", post(handlers::post_chat))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    let public_routes = Router::new().route("/health", get(handlers::get_health));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Binds and serves the gateway until the process exits.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
) -> Result<(), TaskpilotError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TaskpilotError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| TaskpilotError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
