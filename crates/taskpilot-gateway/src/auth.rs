// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the gateway.
//!
//! Extracts the bearer token, verifies it through the configured
//! [`taskpilot_core::AuthAdapter`], and injects the resolved
//! [`UserIdentity`] into request extensions. No token, no request:
//! everything behind this middleware is fail-closed.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use taskpilot_core::types::UserIdentity;

use crate::server::GatewayState;

/// Middleware that validates the bearer credential and attaches the
/// verified identity to the request.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        debug!("request rejected: missing bearer token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.auth.verify(token).await {
        Ok(identity) => {
            request.extensions_mut().insert::<UserIdentity>(identity);
            Ok(next.run(request).await)
        }
        Err(e) => {
            debug!(error = %e, "request rejected: credential verification failed");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
