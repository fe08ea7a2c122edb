// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool server spawning.
//!
//! The channel talks to its server through a [`ServerSpawner`], so tests can
//! substitute an in-memory transport for a real child process.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use taskpilot_config::model::ToolServerConfig;
use taskpilot_core::TaskpilotError;

/// The I/O endpoints of a freshly spawned tool server.
pub struct ServerIo {
    pub writer: Box<dyn AsyncWrite + Send + Unpin>,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub guard: Box<dyn ServerGuard>,
}

impl std::fmt::Debug for ServerIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerIo").finish_non_exhaustive()
    }
}

/// Keeps the underlying server alive and tears it down on demand.
///
/// Dropping the guard must also terminate the server, so a failed
/// handshake never leaks a process.
pub trait ServerGuard: Send {
    /// Requests termination of the underlying server. Idempotent.
    fn terminate(&mut self);
}

/// Spawns tool server instances.
#[async_trait]
pub trait ServerSpawner: Send + Sync {
    async fn spawn(&self) -> Result<ServerIo, TaskpilotError>;
}

/// Spawns the configured executable as a child process, wiring its
/// stdin/stdout as the channel transport.
pub struct ProcessSpawner {
    config: ToolServerConfig,
}

impl ProcessSpawner {
    pub fn new(config: ToolServerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ServerSpawner for ProcessSpawner {
    async fn spawn(&self) -> Result<ServerIo, TaskpilotError> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TaskpilotError::Channel {
                message: format!(
                    "failed to spawn tool server '{}': {e}",
                    self.config.command
                ),
                source: Some(Box::new(e)),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| TaskpilotError::Channel {
            message: "tool server child has no stdin handle".into(),
            source: None,
        })?;
        let stdout = child.stdout.take().ok_or_else(|| TaskpilotError::Channel {
            message: "tool server child has no stdout handle".into(),
            source: None,
        })?;

        debug!(
            command = %self.config.command,
            pid = child.id(),
            "tool server process spawned"
        );

        Ok(ServerIo {
            writer: Box::new(stdin),
            reader: Box::new(stdout),
            guard: Box::new(ChildGuard { child }),
        })
    }
}

struct ChildGuard {
    child: Child,
}

impl ServerGuard for ChildGuard {
    fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            // Already exited is the common case here.
            warn!(error = %e, "tool server kill request failed");
        }
    }
}
