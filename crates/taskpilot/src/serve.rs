// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `taskpilot serve` command implementation.
//!
//! Wires the whole agent at startup: SQLite storage, the Anthropic
//! provider, the tool channel, the turn executor, the token verifier, and
//! the HTTP gateway. Nothing is resolved lazily at request time except the
//! tool channel's own connection, which is lazy by design.

use std::sync::Arc;

use tracing::{error, info};

use taskpilot_agent::TurnExecutor;
use taskpilot_anthropic::AnthropicProvider;
use taskpilot_auth::HsTokenVerifier;
use taskpilot_channel::ToolChannel;
use taskpilot_config::TaskpilotConfig;
use taskpilot_core::{StorageAdapter, TaskpilotError};
use taskpilot_gateway::GatewayState;
use taskpilot_storage::SqliteStorage;

/// Runs the `taskpilot serve` command until the process is stopped.
pub async fn run_serve(mut config: TaskpilotConfig) -> Result<(), TaskpilotError> {
    init_tracing(&config.agent.log_level);

    info!("starting taskpilot serve");

    // Fail closed: the gateway will not start without a verification secret.
    let Some(auth_secret) = config.gateway.auth_secret.clone() else {
        error!("gateway auth secret not configured");
        eprintln!(
            "error: gateway auth secret required. Set gateway.auth_secret in \
             taskpilot.toml or the TASKPILOT_GATEWAY_AUTH_SECRET environment variable."
        );
        return Err(TaskpilotError::Config(
            "gateway.auth_secret is required".into(),
        ));
    };

    // Initialize storage (runs migrations).
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    // Initialize the Anthropic provider.
    let provider = Arc::new(AnthropicProvider::new(&config).map_err(|e| {
        error!(error = %e, "failed to initialize Anthropic provider");
        eprintln!(
            "error: Anthropic API key required. Set anthropic.api_key in config or \
             the ANTHROPIC_API_KEY environment variable."
        );
        e
    })?);

    // Tool channel over the configured server command. Connection itself is
    // lazy: the first chat turn that needs a tool brings it up.
    resolve_tool_server_command(&mut config);
    let channel = ToolChannel::new(config.tool_server.clone());
    info!(
        command = %config.tool_server.command,
        connect_timeout_secs = config.tool_server.connect_timeout_secs,
        "tool channel configured"
    );

    // Turn executor over provider + channel.
    let executor = Arc::new(TurnExecutor::new(
        provider,
        Arc::new(channel),
        &config,
    ));

    let state = GatewayState {
        auth: Arc::new(HsTokenVerifier::new(auth_secret.into_bytes())),
        conversations: storage.clone(),
        runner: executor,
    };

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        model = %config.anthropic.default_model,
        "gateway starting"
    );

    let result = taskpilot_gateway::start_server(&config.gateway, state).await;

    storage.close().await?;
    info!("taskpilot serve shutdown complete");
    result
}

/// Resolves the default tool-server command to this binary's own path, the
/// way the original deployment spawned its own interpreter. An explicit
/// configured command is left untouched.
fn resolve_tool_server_command(config: &mut TaskpilotConfig) {
    if config.tool_server.command == "taskpilot"
        && let Ok(exe) = std::env::current_exe()
    {
        config.tool_server.command = exe.to_string_lossy().into_owned();
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskpilot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
