// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Figment catches type errors and unknown keys; this layer catches values
//! that parse but cannot work at runtime.

use crate::diagnostic::ConfigError;
use crate::model::TaskpilotConfig;

/// Validates a deserialized configuration.
///
/// Returns all problems at once rather than stopping at the first, so the
/// user can fix a config file in one pass.
pub fn validate_config(config: &TaskpilotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.name.trim().is_empty() {
        errors.push(ConfigError::invalid_value(
            "agent.name",
            "must not be empty",
        ));
    }

    if !matches!(
        config.agent.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::invalid_value(
            "agent.log_level",
            "must be one of: trace, debug, info, warn, error",
        ));
    }

    if config.anthropic.max_tokens == 0 {
        errors.push(ConfigError::invalid_value(
            "anthropic.max_tokens",
            "must be greater than zero",
        ));
    }

    if config.anthropic.request_timeout_secs == 0 {
        errors.push(ConfigError::invalid_value(
            "anthropic.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid_value(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if config.tool_server.command.trim().is_empty() {
        errors.push(ConfigError::invalid_value(
            "tool_server.command",
            "must not be empty",
        ));
    }

    if config.tool_server.connect_timeout_secs == 0 {
        errors.push(ConfigError::invalid_value(
            "tool_server.connect_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.tool_server.call_timeout_secs == 0 {
        errors.push(ConfigError::invalid_value(
            "tool_server.call_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.turn.max_tool_rounds == 0 {
        errors.push(ConfigError::invalid_value(
            "turn.max_tool_rounds",
            "must be at least 1",
        ));
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::invalid_value(
            "gateway.port",
            "must be a non-zero port",
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
