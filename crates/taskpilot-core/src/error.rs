// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Taskpilot agent.
//!
//! Recoverable tool failures (timeout, channel unavailable, tool-reported
//! error) are NOT errors -- they are [`crate::tool::ToolOutcome`] variants,
//! so callers are forced to handle the ambiguous-timeout case explicitly.
//! This enum covers the failures that abort an operation outright.

use thiserror::Error;

/// The primary error type used across all Taskpilot crates.
#[derive(Debug, Error)]
pub enum TaskpilotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Credential could not be verified (malformed, bad signature, expired).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Caller identity does not own the requested resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// LLM provider errors (API failure, invalid response, quota exceeded).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Tool channel errors that are not representable as a degraded tool
    /// outcome (protocol violations, spawn configuration problems).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The conversational turn could not run at all (the model provider
    /// failed hard). Distinct from a turn that ran with degraded tools.
    #[error("turn failed: {message}")]
    TurnFailed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Requested entity (task, conversation) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TaskpilotError {
    /// Wraps a provider error as a turn failure, preserving the message.
    pub fn turn_failed_from(err: TaskpilotError) -> Self {
        TaskpilotError::TurnFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_prefixed() {
        let auth = TaskpilotError::Auth("bad token".into());
        assert_eq!(auth.to_string(), "authentication failed: bad token");

        let forbidden = TaskpilotError::Forbidden("u2 != u1".into());
        assert!(forbidden.to_string().starts_with("forbidden"));

        let not_found = TaskpilotError::NotFound("conversation c-1".into());
        assert!(not_found.to_string().contains("conversation c-1"));
    }

    #[test]
    fn turn_failed_wraps_provider_error() {
        let provider = TaskpilotError::Provider {
            message: "API returned 401".into(),
            source: None,
        };
        let turn = TaskpilotError::turn_failed_from(provider);
        match &turn {
            TaskpilotError::TurnFailed { message, source } => {
                assert!(message.contains("API returned 401"));
                assert!(source.is_some());
            }
            other => panic!("expected TurnFailed, got {other:?}"),
        }
    }
}
