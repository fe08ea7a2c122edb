// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task CRUD operations.
//!
//! Every query carries `user_id` in its WHERE clause. A task belonging to
//! another user is indistinguishable from a missing one, which also blocks
//! cross-user id enumeration.

use rusqlite::params;
use taskpilot_core::TaskpilotError;

use crate::database::Database;
use crate::models::Task;

/// Insert a task owned by `user_id` and return the stored record.
pub async fn create_task(
    db: &Database,
    user_id: &str,
    title: &str,
    description: Option<&str>,
    now: &str,
) -> Result<Task, TaskpilotError> {
    let user_id = user_id.to_string();
    let title = title.to_string();
    let description = description.map(String::from);
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tasks (user_id, title, description, completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?4)",
                params![user_id, title, description, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(Task {
                id,
                user_id,
                title,
                description,
                completed: false,
                created_at: now.clone(),
                updated_at: now,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all tasks owned by `user_id`, oldest first.
pub async fn list_tasks(db: &Database, user_id: &str) -> Result<Vec<Task>, TaskpilotError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, title, description, completed, created_at, updated_at
                 FROM tasks WHERE user_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![user_id], row_to_task)?;
            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row?);
            }
            Ok(tasks)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set `completed = true` on an owned task. Returns the updated task, or
/// `None` when no task with that id belongs to `user_id`.
pub async fn complete_task(
    db: &Database,
    user_id: &str,
    task_id: i64,
    now: &str,
) -> Result<Option<Task>, TaskpilotError> {
    let user_id = user_id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE tasks SET completed = 1, updated_at = ?3
                 WHERE id = ?1 AND user_id = ?2",
                params![task_id, user_id, now],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            get_owned_task(conn, &user_id, task_id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete an owned task. Returns the deleted task, or `None` when no task
/// with that id belongs to `user_id`.
pub async fn delete_task(
    db: &Database,
    user_id: &str,
    task_id: i64,
) -> Result<Option<Task>, TaskpilotError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let existing = get_owned_task(conn, &user_id, task_id)?;
            let Some(task) = existing else {
                return Ok(None);
            };
            conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![task_id, user_id],
            )?;
            Ok(Some(task))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Rename an owned task. Returns the previous title and the updated task,
/// or `None` when no task with that id belongs to `user_id`.
pub async fn rename_task(
    db: &Database,
    user_id: &str,
    task_id: i64,
    new_title: &str,
    now: &str,
) -> Result<Option<(String, Task)>, TaskpilotError> {
    let user_id = user_id.to_string();
    let new_title = new_title.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let existing = get_owned_task(conn, &user_id, task_id)?;
            let Some(task) = existing else {
                return Ok(None);
            };
            let old_title = task.title.clone();
            conn.execute(
                "UPDATE tasks SET title = ?3, updated_at = ?4
                 WHERE id = ?1 AND user_id = ?2",
                params![task_id, user_id, new_title, now],
            )?;
            let updated = get_owned_task(conn, &user_id, task_id)?.ok_or_else(|| {
                rusqlite::Error::QueryReturnedNoRows
            })?;
            Ok(Some((old_title, updated)))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn get_owned_task(
    conn: &rusqlite::Connection,
    user_id: &str,
    task_id: i64,
) -> rusqlite::Result<Option<Task>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, description, completed, created_at, updated_at
         FROM tasks WHERE id = ?1 AND user_id = ?2",
    )?;
    match stmt.query_row(params![task_id, user_id], row_to_task) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        completed: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
