// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `taskpilot tool-server` command implementation.
//!
//! Runs the tool server over stdin/stdout against the same SQLite database
//! the gateway uses. Stdout carries the wire protocol, so all logging goes
//! to stderr.

use std::sync::Arc;

use tracing::info;

use taskpilot_config::TaskpilotConfig;
use taskpilot_core::{StorageAdapter, TaskStore, TaskpilotError};
use taskpilot_storage::SqliteStorage;

/// Runs the tool server until stdin closes (the gateway hung up).
pub async fn run_tool_server(config: TaskpilotConfig) -> Result<(), TaskpilotError> {
    init_stderr_tracing(&config.agent.log_level);

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "tool server storage ready");

    let store: Arc<dyn TaskStore> = storage.clone();
    let result = taskpilot_tools::run_stdio_server(store).await;

    storage.close().await?;
    info!("tool server exiting");
    result
}

/// Tracing to stderr only; stdout belongs to the wire protocol.
fn init_stderr_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskpilot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
