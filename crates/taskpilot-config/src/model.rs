// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Taskpilot agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Taskpilot configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskpilotConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Tool server process settings.
    #[serde(default)]
    pub tool_server: ToolServerConfig,

    /// Turn executor settings.
    #[serde(default)]
    pub turn: TurnConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt override. When unset, the built-in task-manager
    /// persona is used.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
        }
    }
}

fn default_agent_name() -> String {
    "taskpilot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the `ANTHROPIC_API_KEY`
    /// environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model to use for LLM requests.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Upper bound on a single provider request, in seconds. Bounds
    /// worst-case turn latency.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("taskpilot").join("taskpilot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("taskpilot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Tool server process configuration.
///
/// The command is resolved once at startup; the channel never probes the
/// filesystem at request time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolServerConfig {
    /// Executable spawned as the tool server.
    #[serde(default = "default_tool_server_command")]
    pub command: String,

    /// Arguments passed to the executable.
    #[serde(default = "default_tool_server_args")]
    pub args: Vec<String>,

    /// Bound on process spawn plus capability handshake, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-call response timeout, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Delay before a degraded channel will attempt a fresh spawn, in
    /// seconds.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            command: default_tool_server_command(),
            args: default_tool_server_args(),
            connect_timeout_secs: default_connect_timeout_secs(),
            call_timeout_secs: default_call_timeout_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

fn default_tool_server_command() -> String {
    "taskpilot".to_string()
}

fn default_tool_server_args() -> Vec<String> {
    vec!["tool-server".to_string()]
}

fn default_connect_timeout_secs() -> u64 {
    60
}

fn default_call_timeout_secs() -> u64 {
    30
}

fn default_retry_backoff_secs() -> u64 {
    5
}

/// Turn executor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TurnConfig {
    /// Ceiling on tool-call rounds within one conversational turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

fn default_max_tool_rounds() -> u32 {
    5
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Shared secret for verifying HS256 bearer tokens. `None` requires
    /// the `TASKPILOT_GATEWAY_AUTH_SECRET` environment variable.
    #[serde(default)]
    pub auth_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            auth_secret: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = TaskpilotConfig::default();
        assert_eq!(config.agent.name, "taskpilot");
        assert_eq!(config.agent.log_level, "info");
        assert_eq!(config.anthropic.max_tokens, 4096);
        assert_eq!(config.anthropic.request_timeout_secs, 120);
        assert_eq!(config.tool_server.connect_timeout_secs, 60);
        assert_eq!(config.tool_server.call_timeout_secs, 30);
        assert_eq!(config.turn.max_tool_rounds, 5);
        assert_eq!(config.gateway.port, 8080);
        assert!(config.gateway.auth_secret.is_none());
    }

    #[test]
    fn tool_server_default_spawns_own_binary() {
        let config = ToolServerConfig::default();
        assert_eq!(config.command, "taskpilot");
        assert_eq!(config.args, vec!["tool-server".to_string()]);
    }

    #[test]
    fn config_serializes_round_trip() {
        let config = TaskpilotConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let back: TaskpilotConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.agent.name, config.agent.name);
        assert_eq!(back.gateway.port, config.gateway.port);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<TaskpilotConfig, _> =
            toml::from_str("[agent]\nnmae = \"typo\"\n");
        assert!(result.is_err());
    }
}
