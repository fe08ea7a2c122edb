// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers: the chat endpoint (the turn orchestrator) and
//! health.
//!
//! Write order is the durability contract: the conversation exists before
//! the user message referencing it, and the user message is persisted
//! before anything that can fail. A failed turn still leaves the user's
//! message in history.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use taskpilot_core::types::{Conversation, Message, Role, UserIdentity};
use taskpilot_core::{TaskpilotError, ToolCallSummary};

use crate::server::GatewayState;

/// Request body for `POST /users/{user_id}/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Conversation to continue; a new one is created when absent.
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Response body for a successful chat turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The conversation this turn was appended to (possibly new).
    pub conversation_id: String,
    /// The assistant's reply.
    pub response: String,
    /// Tool calls the model made during the turn, for observability.
    pub tool_calls: Vec<ToolCallSummary>,
    /// Id of the persisted assistant message.
    pub message_id: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub detail: String,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// POST /users/{user_id}/chat
///
/// Runs one conversational turn for the authenticated user.
pub async fn post_chat(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
    Extension(identity): Extension<UserIdentity>,
    Json(body): Json<ChatRequest>,
) -> Response {
    match chat(&state, &user_id, &identity, body).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn chat(
    state: &GatewayState,
    path_user_id: &str,
    identity: &UserIdentity,
    body: ChatRequest,
) -> Result<ChatResponse, TaskpilotError> {
    // The path user id is a capability check against the verified identity,
    // never a trust boundary crossed by content.
    if identity.user_id != path_user_id {
        return Err(TaskpilotError::Forbidden("Not authorized".into()));
    }

    let conversation_id = resolve_conversation(state, path_user_id, body.thread_id).await?;

    // Persist the inbound message before anything that can fail, so the
    // user's text is never lost to a downstream error.
    let user_message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        conversation_id: conversation_id.clone(),
        role: Role::User,
        content: body.message.clone(),
        tool_calls: None,
        tool_responses: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.conversations.insert_message(&user_message).await?;

    let turn = state
        .runner
        .run_turn(&body.message, &conversation_id, identity)
        .await?;

    let message_id = uuid::Uuid::new_v4().to_string();
    let assistant_message = Message {
        id: message_id.clone(),
        conversation_id: conversation_id.clone(),
        role: Role::Assistant,
        content: turn.final_text.clone(),
        tool_calls: encode_json(&turn.tool_call_summaries)?,
        tool_responses: encode_json(&turn.tool_results)?,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    state.conversations.insert_message(&assistant_message).await?;

    info!(
        user_id = %identity.user_id,
        conversation_id = %conversation_id,
        tool_calls = turn.tool_call_summaries.len(),
        "chat turn complete"
    );

    Ok(ChatResponse {
        conversation_id,
        response: turn.final_text,
        tool_calls: turn.tool_call_summaries,
        message_id,
    })
}

/// Resolves an existing conversation or lazily creates a new one.
///
/// The conversation row is written before any message referencing it;
/// referential integrity is enforced by write order.
async fn resolve_conversation(
    state: &GatewayState,
    user_id: &str,
    thread_id: Option<String>,
) -> Result<String, TaskpilotError> {
    match thread_id {
        Some(id) => match state.conversations.get_conversation(&id).await? {
            Some(conversation) if conversation.user_id == user_id => Ok(id),
            // A foreign conversation is indistinguishable from a missing one.
            Some(_) | None => Err(TaskpilotError::NotFound(format!("conversation {id}"))),
        },
        None => {
            let now = chrono::Utc::now();
            let conversation = Conversation {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                title: format!("Chat {}", now.format("%H:%M")),
                created_at: now.to_rfc3339(),
                updated_at: now.to_rfc3339(),
            };
            state.conversations.create_conversation(&conversation).await?;
            info!(
                conversation_id = %conversation.id,
                user_id,
                "created new conversation"
            );
            Ok(conversation.id)
        }
    }
}

fn encode_json<T: Serialize>(values: &[T]) -> Result<Option<String>, TaskpilotError> {
    if values.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(values)
        .map(Some)
        .map_err(|e| TaskpilotError::Internal(format!("summary serialization failed: {e}")))
}

fn error_response(err: TaskpilotError) -> Response {
    match &err {
        TaskpilotError::Forbidden(_) => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                detail: "Not authorized".into(),
            }),
        )
            .into_response(),
        TaskpilotError::Auth(_) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                detail: "Could not validate credentials".into(),
            }),
        )
            .into_response(),
        TaskpilotError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                detail: format!("{what} not found"),
            }),
        )
            .into_response(),
        _ => {
            error!(error = %err, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
