// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed tool requests and results.
//!
//! Tool arguments are a tagged union validated before dispatch, so malformed
//! model output never reaches the tool server process. Results carry an
//! explicit outcome kind: a timed-out call is NOT a failed call, because the
//! underlying mutation may have been applied before the response was lost.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names of the tools in the catalog, in presentation order.
pub const TOOL_NAMES: [&str; 5] = [
    "add_new_task",
    "list_tasks",
    "mark_task_complete",
    "delete_task",
    "update_task_title",
];

/// A validated tool invocation. Every variant carries the `user_id` the call
/// is scoped to; construction from model output always overwrites it with
/// the authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolRequest {
    AddNewTask {
        user_id: String,
        title: String,
        description: Option<String>,
    },
    ListTasks {
        user_id: String,
    },
    MarkTaskComplete {
        user_id: String,
        task_id: i64,
    },
    DeleteTask {
        user_id: String,
        task_id: i64,
    },
    UpdateTaskTitle {
        user_id: String,
        task_id: i64,
        new_title: String,
    },
}

/// Argument validation failure, produced before anything crosses the
/// process boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolArgError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool {tool}: missing required argument '{argument}'")]
    MissingArgument {
        tool: &'static str,
        argument: &'static str,
    },
    #[error("tool {tool}: argument '{argument}' has an invalid value")]
    InvalidArgument {
        tool: &'static str,
        argument: &'static str,
    },
}

impl ToolRequest {
    /// Returns the wire name of this tool.
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolRequest::AddNewTask { .. } => "add_new_task",
            ToolRequest::ListTasks { .. } => "list_tasks",
            ToolRequest::MarkTaskComplete { .. } => "mark_task_complete",
            ToolRequest::DeleteTask { .. } => "delete_task",
            ToolRequest::UpdateTaskTitle { .. } => "update_task_title",
        }
    }

    /// Returns the user the call is scoped to.
    pub fn user_id(&self) -> &str {
        match self {
            ToolRequest::AddNewTask { user_id, .. }
            | ToolRequest::ListTasks { user_id }
            | ToolRequest::MarkTaskComplete { user_id, .. }
            | ToolRequest::DeleteTask { user_id, .. }
            | ToolRequest::UpdateTaskTitle { user_id, .. } => user_id,
        }
    }

    /// Builds a request from a model-emitted tool call.
    ///
    /// The `user_id` argument the model supplied (if any) is discarded and
    /// replaced with the authenticated identity -- identity is injected by
    /// the orchestrator, never trusted from model output.
    pub fn from_model_call(
        name: &str,
        input: &Value,
        authenticated_user_id: &str,
    ) -> Result<Self, ToolArgError> {
        let mut args = input.clone();
        if let Some(obj) = args.as_object_mut() {
            obj.insert(
                "user_id".to_string(),
                Value::String(authenticated_user_id.to_string()),
            );
        } else {
            args = serde_json::json!({ "user_id": authenticated_user_id });
        }
        Self::from_wire(name, &args)
    }

    /// Builds a request from wire-format `{tool_name, arguments}` data,
    /// validating all required fields.
    pub fn from_wire(tool_name: &str, arguments: &Value) -> Result<Self, ToolArgError> {
        match tool_name {
            "add_new_task" => Ok(ToolRequest::AddNewTask {
                user_id: required_str(arguments, "add_new_task", "user_id")?,
                title: required_str(arguments, "add_new_task", "title")?,
                description: optional_str(arguments, "description"),
            }),
            "list_tasks" => Ok(ToolRequest::ListTasks {
                user_id: required_str(arguments, "list_tasks", "user_id")?,
            }),
            "mark_task_complete" => Ok(ToolRequest::MarkTaskComplete {
                user_id: required_str(arguments, "mark_task_complete", "user_id")?,
                task_id: required_task_id(arguments, "mark_task_complete")?,
            }),
            "delete_task" => Ok(ToolRequest::DeleteTask {
                user_id: required_str(arguments, "delete_task", "user_id")?,
                task_id: required_task_id(arguments, "delete_task")?,
            }),
            "update_task_title" => Ok(ToolRequest::UpdateTaskTitle {
                user_id: required_str(arguments, "update_task_title", "user_id")?,
                task_id: required_task_id(arguments, "update_task_title")?,
                new_title: required_str(arguments, "update_task_title", "new_title")?,
            }),
            other => Err(ToolArgError::UnknownTool(other.to_string())),
        }
    }

    /// Returns the wire-format argument object for this request.
    pub fn arguments(&self) -> Value {
        match self {
            ToolRequest::AddNewTask {
                user_id,
                title,
                description,
            } => {
                let mut obj = serde_json::json!({
                    "user_id": user_id,
                    "title": title,
                });
                if let Some(desc) = description {
                    obj["description"] = Value::String(desc.clone());
                }
                obj
            }
            ToolRequest::ListTasks { user_id } => serde_json::json!({ "user_id": user_id }),
            ToolRequest::MarkTaskComplete { user_id, task_id } => {
                serde_json::json!({ "user_id": user_id, "task_id": task_id })
            }
            ToolRequest::DeleteTask { user_id, task_id } => {
                serde_json::json!({ "user_id": user_id, "task_id": task_id })
            }
            ToolRequest::UpdateTaskTitle {
                user_id,
                task_id,
                new_title,
            } => serde_json::json!({
                "user_id": user_id,
                "task_id": task_id,
                "new_title": new_title,
            }),
        }
    }
}

fn required_str(
    args: &Value,
    tool: &'static str,
    key: &'static str,
) -> Result<String, ToolArgError> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(_) => Err(ToolArgError::InvalidArgument {
            tool,
            argument: key,
        }),
        None => Err(ToolArgError::MissingArgument {
            tool,
            argument: key,
        }),
    }
}

fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

/// Accepts either a JSON number or a numeric string, since models emit both.
fn required_task_id(args: &Value, tool: &'static str) -> Result<i64, ToolArgError> {
    match args.get("task_id") {
        Some(Value::Number(n)) => n.as_i64().ok_or(ToolArgError::InvalidArgument {
            tool,
            argument: "task_id",
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            ToolArgError::InvalidArgument {
                tool,
                argument: "task_id",
            }
        }),
        Some(_) => Err(ToolArgError::InvalidArgument {
            tool,
            argument: "task_id",
        }),
        None => Err(ToolArgError::MissingArgument {
            tool,
            argument: "task_id",
        }),
    }
}

/// The outcome of one tool call, with an explicit kind for each failure mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The tool ran and returned output.
    Success { output: String },
    /// The tool ran and reported a definite failure.
    Failed { error: String },
    /// No response arrived in time. The mutation may still have been
    /// applied -- callers must not assume timeout implies no-op.
    TimedOut { waited_ms: u64 },
    /// The tool channel was not connected and could not be brought up.
    Unavailable { reason: String },
}

impl ToolOutcome {
    pub fn timed_out(waited: Duration) -> Self {
        ToolOutcome::TimedOut {
            waited_ms: waited.as_millis() as u64,
        }
    }

    /// True only for a definite success.
    pub fn succeeded(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// True for the ambiguous outcomes (timeout, channel down) that call
    /// for an advisory rather than an error report.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            ToolOutcome::TimedOut { .. } | ToolOutcome::Unavailable { .. }
        )
    }

    /// Text fed back into the model context for the follow-up generation.
    pub fn model_text(&self) -> String {
        match self {
            ToolOutcome::Success { output } => output.clone(),
            ToolOutcome::Failed { error } => format!("Error: {error}"),
            ToolOutcome::TimedOut { waited_ms } => format!(
                "The tool call did not respond within {waited_ms}ms. It may still \
                 have been applied; advise the user to refresh their task list."
            ),
            ToolOutcome::Unavailable { reason } => {
                format!("The task system is currently unavailable: {reason}")
            }
        }
    }
}

/// The attributed result of one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub outcome: ToolOutcome,
}

/// Observability record of a tool call the model requested; reported to the
/// caller verbatim and never used for control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallSummary {
    pub tool: String,
    pub parameters: Value,
}
