// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool channel: a managed connection to the tool server process.
//!
//! State machine: Uninitialized -> Connecting -> Ready, with Degraded on
//! any spawn, handshake, or I/O failure. A degraded channel self-heals:
//! after the backoff window the next call attempts a fresh spawn.
//!
//! Invariants:
//! - At most one spawn/handshake attempt is in flight at any time. The
//!   attempt runs while holding the state mutex, so concurrent callers
//!   suspend on the lock instead of spawning duplicates.
//! - At most one live server process. The previous connection's guard is
//!   terminated before a new spawn, and an attempt abandoned by the
//!   connect timeout tears its process down on drop.
//! - The state mutex is never held across a tool call's request/response
//!   exchange; in-flight calls are correlated by request id.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

use taskpilot_config::model::ToolServerConfig;
use taskpilot_core::{
    AdapterType, HealthStatus, PluginAdapter, TaskpilotError, ToolDispatch, ToolOutcome,
    ToolRequest, ToolResult,
};
use taskpilot_tools::wire::{ServerCapabilities, WireRequest, WireResponse};

use crate::spawner::{ProcessSpawner, ServerGuard, ServerIo, ServerSpawner};

/// Connection state of the tool channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No connection attempt has been made yet.
    Uninitialized,
    /// A spawn/handshake attempt is in flight.
    Connecting,
    /// Handshake completed; calls flow over the live connection.
    Ready,
    /// The last attempt or connection failed; self-heals on next use.
    Degraded,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelState::Uninitialized => write!(f, "uninitialized"),
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Ready => write!(f, "ready"),
            ChannelState::Degraded => write!(f, "degraded"),
        }
    }
}

impl ChannelState {
    fn tag(self) -> u8 {
        match self {
            ChannelState::Uninitialized => 0,
            ChannelState::Connecting => 1,
            ChannelState::Ready => 2,
            ChannelState::Degraded => 3,
        }
    }

    fn from_tag(tag: u8) -> Self {
        match tag {
            1 => ChannelState::Connecting,
            2 => ChannelState::Ready,
            3 => ChannelState::Degraded,
            _ => ChannelState::Uninitialized,
        }
    }
}

type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;
type ServerReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;

struct Connection {
    writer: SharedWriter,
    guard: Box<dyn ServerGuard>,
    generation: u64,
}

struct ChannelCore {
    state: ChannelState,
    conn: Option<Connection>,
    last_failure_at: Option<Instant>,
    last_failure_reason: String,
    next_generation: u64,
}

struct ChannelShared {
    core: Mutex<ChannelCore>,
    /// request_id -> waiting caller. Written by callers, drained by the
    /// reader task; responses can never be cross-delivered because ids are
    /// unique per call.
    pending: DashMap<String, oneshot::Sender<WireResponse>>,
    spawner: Box<dyn ServerSpawner>,
    config: ToolServerConfig,
    spawn_attempts: AtomicU64,
    /// Lock-free mirror of `core.state` for observability.
    state_tag: AtomicU8,
}

impl ChannelShared {
    fn set_state(&self, core: &mut ChannelCore, state: ChannelState) {
        core.state = state;
        self.state_tag.store(state.tag(), Ordering::SeqCst);
    }

    fn degrade(&self, core: &mut ChannelCore, reason: &str) {
        warn!(reason = %reason, "tool channel degraded");
        if let Some(mut conn) = core.conn.take() {
            conn.guard.terminate();
        }
        core.last_failure_at = Some(Instant::now());
        core.last_failure_reason = reason.to_string();
        self.set_state(core, ChannelState::Degraded);
    }
}

/// Managed connection to the tool server.
///
/// Cheap to clone; all clones share one underlying connection and state
/// machine. Constructed once at startup and passed into the orchestrator.
#[derive(Clone)]
pub struct ToolChannel {
    inner: Arc<ChannelShared>,
}

impl ToolChannel {
    /// Creates a channel that spawns the configured tool server command.
    pub fn new(config: ToolServerConfig) -> Self {
        let spawner = Box::new(ProcessSpawner::new(config.clone()));
        Self::with_spawner(spawner, config)
    }

    /// Creates a channel over a custom spawner (used by tests to run an
    /// in-memory server).
    pub fn with_spawner(spawner: Box<dyn ServerSpawner>, config: ToolServerConfig) -> Self {
        Self {
            inner: Arc::new(ChannelShared {
                core: Mutex::new(ChannelCore {
                    state: ChannelState::Uninitialized,
                    conn: None,
                    last_failure_at: None,
                    last_failure_reason: String::new(),
                    next_generation: 0,
                }),
                pending: DashMap::new(),
                spawner,
                config,
                spawn_attempts: AtomicU64::new(0),
                state_tag: AtomicU8::new(ChannelState::Uninitialized.tag()),
            }),
        }
    }

    /// Current channel state (lock-free snapshot).
    pub fn state(&self) -> ChannelState {
        ChannelState::from_tag(self.inner.state_tag.load(Ordering::SeqCst))
    }

    /// Number of spawn/handshake attempts made so far.
    pub fn spawn_attempts(&self) -> u64 {
        self.inner.spawn_attempts.load(Ordering::SeqCst)
    }

    /// Per-call timeout from configuration.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.inner.config.call_timeout_secs)
    }

    /// Resolves the channel to a usable writer, connecting if necessary.
    ///
    /// Holds the state mutex for the duration of any connection attempt, so
    /// concurrent callers block on (not duplicate) the attempt. Returns the
    /// degradation reason when the channel cannot be brought up.
    async fn ensure_ready(&self) -> Result<SharedWriter, String> {
        let mut core = self.inner.core.lock().await;
        match core.state {
            ChannelState::Ready => match core.conn.as_ref() {
                Some(conn) => Ok(conn.writer.clone()),
                None => self.establish(&mut core).await,
            },
            ChannelState::Degraded => {
                let backoff = Duration::from_secs(self.inner.config.retry_backoff_secs);
                if core.last_failure_at.is_some_and(|at| at.elapsed() < backoff) {
                    return Err(format!(
                        "{} (in retry backoff)",
                        core.last_failure_reason
                    ));
                }
                self.establish(&mut core).await
            }
            // Connecting is unobservable here: the connecting caller holds
            // the lock we just acquired.
            ChannelState::Uninitialized | ChannelState::Connecting => {
                self.establish(&mut core).await
            }
        }
    }

    /// Spawns the server and performs the capability handshake, bounded by
    /// the connect timeout. Transitions to Ready or Degraded.
    async fn establish(&self, core: &mut ChannelCore) -> Result<SharedWriter, String> {
        self.inner.set_state(core, ChannelState::Connecting);
        if let Some(mut stale) = core.conn.take() {
            stale.guard.terminate();
        }

        self.inner.spawn_attempts.fetch_add(1, Ordering::SeqCst);
        let connect_timeout = Duration::from_secs(self.inner.config.connect_timeout_secs);

        match tokio::time::timeout(connect_timeout, self.connect_and_handshake()).await {
            Ok(Ok((writer, reader, guard, capabilities))) => {
                let generation = core.next_generation;
                core.next_generation += 1;

                let writer: SharedWriter = Arc::new(Mutex::new(writer));
                core.conn = Some(Connection {
                    writer: writer.clone(),
                    guard,
                    generation,
                });
                core.last_failure_at = None;
                self.inner.set_state(core, ChannelState::Ready);

                spawn_reader(self.inner.clone(), reader, generation);

                info!(
                    server = %capabilities.server,
                    tools = capabilities.tools.len(),
                    generation,
                    "tool channel ready"
                );
                Ok(writer)
            }
            Ok(Err(e)) => {
                let reason = e.to_string();
                self.inner.degrade(core, &reason);
                Err(reason)
            }
            // The abandoned attempt's guard is dropped with the future,
            // which tears down any process it managed to spawn.
            Err(_) => {
                let reason =
                    format!("tool server handshake timed out after {connect_timeout:?}");
                self.inner.degrade(core, &reason);
                Err(reason)
            }
        }
    }

    async fn connect_and_handshake(
        &self,
    ) -> Result<
        (
            Box<dyn AsyncWrite + Send + Unpin>,
            ServerReader,
            Box<dyn ServerGuard>,
            ServerCapabilities,
        ),
        TaskpilotError,
    > {
        let ServerIo {
            mut writer,
            reader,
            guard,
        } = self.inner.spawner.spawn().await?;
        let mut reader: ServerReader = BufReader::new(reader);

        let request_id = uuid::Uuid::new_v4().to_string();
        let request = WireRequest::Initialize {
            request_id: request_id.clone(),
        };
        write_line(&mut writer, &request).await?;

        let mut line = String::new();
        let bytes = reader
            .read_line(&mut line)
            .await
            .map_err(|e| TaskpilotError::Channel {
                message: format!("tool server handshake read failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        if bytes == 0 {
            return Err(TaskpilotError::Channel {
                message: "tool server closed the connection during handshake".into(),
                source: None,
            });
        }

        let response: WireResponse =
            serde_json::from_str(line.trim()).map_err(|e| TaskpilotError::Channel {
                message: format!("tool server handshake response unparseable: {e}"),
                source: Some(Box::new(e)),
            })?;
        if response.request_id != request_id {
            return Err(TaskpilotError::Channel {
                message: "tool server handshake correlation mismatch".into(),
                source: None,
            });
        }
        if !response.success {
            return Err(TaskpilotError::Channel {
                message: format!(
                    "tool server rejected handshake: {}",
                    response.error.unwrap_or_else(|| "unknown error".into())
                ),
                source: None,
            });
        }

        let capabilities: ServerCapabilities = serde_json::from_str(&response.output)
            .map_err(|e| TaskpilotError::Channel {
                message: format!("tool server capabilities unparseable: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok((writer, reader, guard, capabilities))
    }

    /// Executes one tool call and classifies the outcome.
    async fn call_outcome(&self, request: &ToolRequest, timeout: Duration) -> ToolOutcome {
        let writer = match self.ensure_ready().await {
            Ok(writer) => writer,
            Err(reason) => return ToolOutcome::Unavailable { reason },
        };

        let request_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(request_id.clone(), tx);

        let wire = WireRequest::ToolCall {
            request_id: request_id.clone(),
            tool_name: request.tool_name().to_string(),
            arguments: request.arguments(),
        };

        {
            let mut writer = writer.lock().await;
            if let Err(e) = write_line(&mut *writer, &wire).await {
                drop(writer);
                self.inner.pending.remove(&request_id);
                let reason = format!("tool server write failed: {e}");
                let mut core = self.inner.core.lock().await;
                self.inner.degrade(&mut core, &reason);
                return ToolOutcome::Unavailable { reason };
            }
        }

        debug!(tool = request.tool_name(), request_id = %request_id, "tool call sent");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => {
                if response.success {
                    ToolOutcome::Success {
                        output: response.output,
                    }
                } else {
                    ToolOutcome::Failed {
                        error: response
                            .error
                            .unwrap_or_else(|| "tool call failed".to_string()),
                    }
                }
            }
            // The reader task dropped our sender: the connection died while
            // we were waiting.
            Ok(Err(_)) => ToolOutcome::Unavailable {
                reason: "tool server connection lost".into(),
            },
            // A late response for this id will be logged and discarded by
            // the reader task. The mutation may still have been applied.
            Err(_) => {
                self.inner.pending.remove(&request_id);
                ToolOutcome::timed_out(timeout)
            }
        }
    }
}

#[async_trait]
impl ToolDispatch for ToolChannel {
    async fn call(&self, request: ToolRequest, timeout: Duration) -> ToolResult {
        let tool_name = request.tool_name().to_string();
        let outcome = self.call_outcome(&request, timeout).await;
        ToolResult { tool_name, outcome }
    }
}

#[async_trait]
impl PluginAdapter for ToolChannel {
    fn name(&self) -> &str {
        "tool-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ToolChannel
    }

    async fn health_check(&self) -> Result<HealthStatus, TaskpilotError> {
        let core = self.inner.core.lock().await;
        Ok(match core.state {
            ChannelState::Ready => HealthStatus::Healthy,
            ChannelState::Uninitialized | ChannelState::Connecting => {
                HealthStatus::Degraded(format!("channel {}", core.state))
            }
            ChannelState::Degraded => {
                HealthStatus::Degraded(core.last_failure_reason.clone())
            }
        })
    }

    async fn shutdown(&self) -> Result<(), TaskpilotError> {
        let mut core = self.inner.core.lock().await;
        if let Some(mut conn) = core.conn.take() {
            conn.guard.terminate();
        }
        self.inner.set_state(&mut core, ChannelState::Uninitialized);
        self.inner.pending.clear();
        debug!("tool channel shut down");
        Ok(())
    }
}

/// Pumps responses from the server to waiting callers until the stream
/// closes, then degrades the channel if this connection is still current.
fn spawn_reader(shared: Arc<ChannelShared>, reader: ServerReader, generation: u64) {
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<WireResponse>(trimmed) {
                        Ok(response) => {
                            match shared.pending.remove(&response.request_id) {
                                Some((_, tx)) => {
                                    // Receiver may have timed out; nothing to do then.
                                    let _ = tx.send(response);
                                }
                                None => {
                                    debug!(
                                        request_id = %response.request_id,
                                        "late response discarded (caller timed out)"
                                    );
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "unparseable line from tool server");
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "tool server read error");
                    break;
                }
            }
        }

        let mut core = shared.core.lock().await;
        let is_current = core
            .conn
            .as_ref()
            .is_some_and(|conn| conn.generation == generation);
        if is_current {
            shared.degrade(&mut core, "tool server closed the connection");
            // Wake callers still waiting on this connection; their receivers
            // resolve to Unavailable instead of waiting out the timeout.
            shared.pending.clear();
        }
    });
}

async fn write_line<W>(writer: &mut W, request: &WireRequest) -> Result<(), TaskpilotError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut line = serde_json::to_string(request).map_err(|e| TaskpilotError::Internal(
        format!("request serialization failed: {e}"),
    ))?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .map_err(|e| TaskpilotError::Channel {
            message: format!("write failed: {e}"),
            source: Some(Box::new(e)),
        })?;
    writer.flush().await.map_err(|e| TaskpilotError::Channel {
        message: format!("flush failed: {e}"),
        source: Some(Box::new(e)),
    })
}
