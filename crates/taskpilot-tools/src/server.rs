// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool server loop: one JSON request per line in, one JSON response
//! per line out.
//!
//! Generic over the transport so tests can drive it through an in-memory
//! duplex pipe; production runs it over stdin/stdout of a child process.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use taskpilot_core::{TaskStore, TaskpilotError, ToolRequest};

use crate::catalog;
use crate::dispatch;
use crate::wire::{ServerCapabilities, WireRequest, WireResponse};

/// Serves tool requests from `reader`, writing responses to `writer`,
/// until the input stream closes.
pub async fn serve<R, W>(
    store: Arc<dyn TaskStore>,
    reader: R,
    mut writer: W,
) -> Result<(), TaskpilotError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .await
            .map_err(|e| TaskpilotError::Channel {
                message: format!("tool server read failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        if bytes == 0 {
            debug!("input closed, tool server exiting");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<WireRequest>(trimmed) {
            Ok(request) => handle_request(request, store.as_ref()).await,
            Err(parse_err) => {
                // Salvage the correlation id if the line was at least JSON,
                // so the client does not wait out its timeout.
                let request_id = serde_json::from_str::<serde_json::Value>(trimmed)
                    .ok()
                    .and_then(|v| {
                        v.get("request_id")
                            .and_then(|r| r.as_str())
                            .map(String::from)
                    });
                match request_id {
                    Some(id) => WireResponse::err(id, format!("malformed request: {parse_err}")),
                    None => {
                        warn!(error = %parse_err, "dropping uncorrelatable malformed line");
                        continue;
                    }
                }
            }
        };

        let mut out = serde_json::to_string(&response).map_err(|e| {
            TaskpilotError::Internal(format!("response serialization failed: {e}"))
        })?;
        out.push('\n');
        writer
            .write_all(out.as_bytes())
            .await
            .map_err(|e| TaskpilotError::Channel {
                message: format!("tool server write failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        writer.flush().await.map_err(|e| TaskpilotError::Channel {
            message: format!("tool server flush failed: {e}"),
            source: Some(Box::new(e)),
        })?;
    }

    Ok(())
}

/// Serves tool requests over the process's stdin/stdout.
pub async fn run_stdio_server(store: Arc<dyn TaskStore>) -> Result<(), TaskpilotError> {
    serve(store, tokio::io::stdin(), tokio::io::stdout()).await
}

async fn handle_request(request: WireRequest, store: &dyn TaskStore) -> WireResponse {
    match request {
        WireRequest::Initialize { request_id } => {
            let capabilities = ServerCapabilities {
                server: "taskpilot-tools".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                tools: catalog::tool_names(),
            };
            match serde_json::to_string(&capabilities) {
                Ok(payload) => WireResponse::ok(request_id, payload),
                Err(e) => WireResponse::err(request_id, format!("handshake failed: {e}")),
            }
        }
        WireRequest::ToolCall {
            request_id,
            tool_name,
            arguments,
        } => {
            debug!(tool = %tool_name, "tool call received");
            match ToolRequest::from_wire(&tool_name, &arguments) {
                Ok(tool_request) => match dispatch::execute(&tool_request, store).await {
                    Ok(output) => WireResponse::ok(request_id, output),
                    // The tool ran but the store failed; report it as tool
                    // output so the model can phrase the failure.
                    Err(e) => WireResponse::ok(request_id, format!("Error: {e}")),
                },
                Err(e) => WireResponse::err(request_id, e.to_string()),
            }
        }
    }
}
