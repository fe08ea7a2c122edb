// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Taskpilot agent.
//!
//! This crate provides the foundational trait definitions, error types,
//! domain types, and the typed tool request/result model used throughout
//! the Taskpilot workspace.

pub mod error;
pub mod tool;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TaskpilotError;
pub use tool::{ToolCallSummary, ToolOutcome, ToolRequest, ToolResult};
pub use types::{AdapterType, HealthStatus, UserIdentity};

// Re-export all adapter traits at crate root.
pub use traits::{
    AuthAdapter, ConversationStore, PluginAdapter, ProviderAdapter, StorageAdapter,
    TaskStore, ToolDispatch,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = TaskpilotError::Config("test".into());
        let _storage = TaskpilotError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _auth = TaskpilotError::Auth("test".into());
        let _forbidden = TaskpilotError::Forbidden("test".into());
        let _provider = TaskpilotError::Provider {
            message: "test".into(),
            source: None,
        };
        let _channel = TaskpilotError::Channel {
            message: "test".into(),
            source: None,
        };
        let _turn = TaskpilotError::TurnFailed {
            message: "test".into(),
            source: None,
        };
        let _not_found = TaskpilotError::NotFound("test".into());
        let _timeout = TaskpilotError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = TaskpilotError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // If any trait module is missing or has a compile error, this test
        // won't compile.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_conversation_store<T: ConversationStore>() {}
        fn _assert_task_store<T: TaskStore>() {}
        fn _assert_auth_adapter<T: AuthAdapter>() {}
        fn _assert_tool_dispatch<T: ToolDispatch>() {}
    }
}
