// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool execution against the task store.
//!
//! Output strings are the tool contract: the model reads them verbatim and
//! phrases the user-facing reply from them. "Not found" covers both a
//! missing task and another user's task, so task-id existence is never
//! leaked across users.

use taskpilot_core::{TaskStore, TaskpilotError, ToolRequest};

/// Default description for tasks created through the agent.
const DEFAULT_DESCRIPTION: &str = "Added via AI";

/// Executes a validated tool request and returns its output text.
pub async fn execute(
    request: &ToolRequest,
    store: &dyn TaskStore,
) -> Result<String, TaskpilotError> {
    match request {
        ToolRequest::AddNewTask {
            user_id,
            title,
            description,
        } => {
            let description = description.as_deref().unwrap_or(DEFAULT_DESCRIPTION);
            let task = store.create_task(user_id, title, Some(description)).await?;
            Ok(format!("Success: '{}' added.", task.title))
        }
        ToolRequest::ListTasks { user_id } => {
            let tasks = store.list_tasks(user_id).await?;
            if tasks.is_empty() {
                return Ok("No tasks found.".to_string());
            }
            let rows: Vec<String> = tasks
                .iter()
                .map(|t| {
                    format!(
                        "ID: {} | [{}] {}",
                        t.id,
                        if t.completed { "X" } else { " " },
                        t.title
                    )
                })
                .collect();
            Ok(rows.join("\n"))
        }
        ToolRequest::MarkTaskComplete { user_id, task_id } => {
            match store.complete_task(user_id, *task_id).await? {
                Some(task) => Ok(format!(
                    "Success: Task '{}' marked as complete.",
                    task.title
                )),
                None => Ok(format!(
                    "Task with ID {task_id} not found for this user."
                )),
            }
        }
        ToolRequest::DeleteTask { user_id, task_id } => {
            match store.delete_task(user_id, *task_id).await? {
                Some(task) => Ok(format!("Success: Task '{}' has been deleted.", task.title)),
                None => Ok(format!("Task with ID {task_id} not found.")),
            }
        }
        ToolRequest::UpdateTaskTitle {
            user_id,
            task_id,
            new_title,
        } => match store.rename_task(user_id, *task_id, new_title).await? {
            Some((old_title, task)) => Ok(format!(
                "Success: Updated task '{}' to '{}'.",
                old_title, task.title
            )),
            None => Ok(format!("Task with ID {task_id} not found.")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTaskStore;

    #[tokio::test]
    async fn add_reports_title() {
        let store = MemoryTaskStore::new();
        let req = ToolRequest::AddNewTask {
            user_id: "u1".into(),
            title: "buy milk".into(),
            description: None,
        };
        let output = execute(&req, &store).await.unwrap();
        assert_eq!(output, "Success: 'buy milk' added.");

        // Default description is applied when the model omits one.
        let tasks = store.list_all("u1").await;
        assert_eq!(tasks[0].description.as_deref(), Some("Added via AI"));
    }

    #[tokio::test]
    async fn list_formats_rows_with_status_markers() {
        let store = MemoryTaskStore::new();
        store.seed("u1", "buy milk", false).await;
        store.seed("u1", "call mom", true).await;

        let req = ToolRequest::ListTasks {
            user_id: "u1".into(),
        };
        let output = execute(&req, &store).await.unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[ ] buy milk"));
        assert!(lines[1].contains("[X] call mom"));
        assert!(lines[0].starts_with("ID: "));
    }

    #[tokio::test]
    async fn list_with_no_tasks() {
        let store = MemoryTaskStore::new();
        let req = ToolRequest::ListTasks {
            user_id: "u1".into(),
        };
        let output = execute(&req, &store).await.unwrap();
        assert_eq!(output, "No tasks found.");
    }

    #[tokio::test]
    async fn complete_not_found_message_is_user_scoped() {
        let store = MemoryTaskStore::new();
        let id = store.seed("u2", "theirs", false).await;

        let req = ToolRequest::MarkTaskComplete {
            user_id: "u1".into(),
            task_id: id,
        };
        let output = execute(&req, &store).await.unwrap();
        assert_eq!(
            output,
            format!("Task with ID {id} not found for this user.")
        );
    }

    #[tokio::test]
    async fn complete_and_delete_confirmations() {
        let store = MemoryTaskStore::new();
        let id = store.seed("u1", "buy milk", false).await;

        let output = execute(
            &ToolRequest::MarkTaskComplete {
                user_id: "u1".into(),
                task_id: id,
            },
            &store,
        )
        .await
        .unwrap();
        assert_eq!(output, "Success: Task 'buy milk' marked as complete.");

        let output = execute(
            &ToolRequest::DeleteTask {
                user_id: "u1".into(),
                task_id: id,
            },
            &store,
        )
        .await
        .unwrap();
        assert_eq!(output, "Success: Task 'buy milk' has been deleted.");
    }

    #[tokio::test]
    async fn update_reports_old_and_new_title() {
        let store = MemoryTaskStore::new();
        let id = store.seed("u1", "buy milk", false).await;

        let output = execute(
            &ToolRequest::UpdateTaskTitle {
                user_id: "u1".into(),
                task_id: id,
                new_title: "buy oat milk".into(),
            },
            &store,
        )
        .await
        .unwrap();
        assert_eq!(output, "Success: Updated task 'buy milk' to 'buy oat milk'.");
    }
}
