// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol for the tool server process boundary.
//!
//! One JSON object per line in each direction. Requests and responses are
//! correlated by `request_id`; the server never reorders a response onto a
//! different request's id.

use serde::{Deserialize, Serialize};

/// A client-to-server message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireRequest {
    /// Capability handshake; must be answered before tool calls are sent.
    Initialize { request_id: String },
    /// One tool invocation.
    ToolCall {
        request_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },
}

impl WireRequest {
    /// Returns the correlation id of this request.
    pub fn request_id(&self) -> &str {
        match self {
            WireRequest::Initialize { request_id } => request_id,
            WireRequest::ToolCall { request_id, .. } => request_id,
        }
    }
}

/// A server-to-client message.
///
/// `success = false` means the dispatch itself failed (unknown tool,
/// invalid arguments); a tool that ran and reported a problem still comes
/// back with `success = true` and an `Error: ...` output for the model to
/// phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
    pub request_id: String,
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WireResponse {
    pub fn ok(request_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn err(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Payload of a successful `Initialize` response, serialized into `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub server: String,
    pub version: String,
    pub tools: Vec<String>,
}
