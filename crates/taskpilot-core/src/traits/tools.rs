// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch trait for the tool channel.

use std::time::Duration;

use async_trait::async_trait;

use crate::tool::{ToolRequest, ToolResult};

/// Dispatches validated tool requests to the tool server.
///
/// `call` never returns an error: channel problems surface as
/// [`crate::tool::ToolOutcome::Unavailable`] or
/// [`crate::tool::ToolOutcome::TimedOut`] so the turn executor can degrade
/// gracefully instead of aborting the turn. The trait exists so the
/// executor can be tested against a deterministic fake channel.
#[async_trait]
pub trait ToolDispatch: Send + Sync {
    /// Executes one tool call with the given response timeout.
    async fn call(&self, request: ToolRequest, timeout: Duration) -> ToolResult;
}
