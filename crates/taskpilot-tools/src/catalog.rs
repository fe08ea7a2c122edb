// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool catalog metadata.
//!
//! Definitions are generated in the provider wire format:
//! `{name, description, input_schema}`. The same catalog backs the
//! handshake capability listing and the model-facing tool offer. Every
//! schema requires `user_id`; the executor overwrites it with the
//! authenticated identity before dispatch, so the model never has to get
//! it right.

use taskpilot_core::tool::TOOL_NAMES;

/// Returns provider-format tool definitions for the full catalog.
pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "name": "add_new_task",
            "description": "Add a new task. Requires user_id and title.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "title": { "type": "string" },
                    "description": { "type": "string" }
                },
                "required": ["user_id", "title"]
            }
        }),
        serde_json::json!({
            "name": "list_tasks",
            "description": "List all tasks for a specific user. Shows ID, Status, and Title.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" }
                },
                "required": ["user_id"]
            }
        }),
        serde_json::json!({
            "name": "mark_task_complete",
            "description": "Mark a task as completed. Requires user_id and task_id.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "task_id": { "type": "integer" }
                },
                "required": ["user_id", "task_id"]
            }
        }),
        serde_json::json!({
            "name": "delete_task",
            "description": "Permanently delete a task. Requires user_id and task_id.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "task_id": { "type": "integer" }
                },
                "required": ["user_id", "task_id"]
            }
        }),
        serde_json::json!({
            "name": "update_task_title",
            "description": "Update the title of an existing task.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "task_id": { "type": "integer" },
                    "new_title": { "type": "string" }
                },
                "required": ["user_id", "task_id", "new_title"]
            }
        }),
    ]
}

/// Returns the catalog's tool names, matching the definitions order.
pub fn tool_names() -> Vec<String> {
    TOOL_NAMES.iter().map(|s| s.to_string()).collect()
}
