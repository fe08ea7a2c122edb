// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Taskpilot - a conversational task-manager agent.
//!
//! This is the binary entry point. `serve` runs the chat gateway; the
//! `tool-server` subcommand is what the gateway's tool channel spawns.

mod serve;
mod tool_server;

use clap::{Parser, Subcommand};

/// Taskpilot - a conversational task-manager agent.
#[derive(Parser, Debug)]
#[command(name = "taskpilot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the chat gateway.
    Serve,
    /// Run the tool server over stdin/stdout (spawned by the gateway).
    ToolServer,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match taskpilot_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            taskpilot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::ToolServer) => tool_server::run_tool_server(config).await,
    };

    if let Err(e) = result {
        eprintln!("taskpilot: {e}");
        std::process::exit(1);
    }
}
