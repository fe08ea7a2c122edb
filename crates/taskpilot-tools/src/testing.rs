// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory task store for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use taskpilot_core::types::Task;
use taskpilot_core::{TaskStore, TaskpilotError};

/// HashMap-backed task store mirroring the SQLite semantics: owner scoping
/// on every operation, `None` for missing or foreign tasks.
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<i64, Task>>,
    next_id: AtomicI64,
    /// When set, every operation fails with a storage error.
    pub fail_all: std::sync::atomic::AtomicBool,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            fail_all: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub async fn seed(&self, user_id: &str, title: &str, completed: bool) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().await.insert(
            id,
            Task {
                id,
                user_id: user_id.to_string(),
                title: title.to_string(),
                description: None,
                completed,
                created_at: "2026-01-01T00:00:00.000Z".to_string(),
                updated_at: "2026-01-01T00:00:00.000Z".to_string(),
            },
        );
        id
    }

    pub async fn list_all(&self, user_id: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .lock()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    fn check_failure(&self) -> Result<(), TaskpilotError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(TaskpilotError::Storage {
                source: "injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, TaskpilotError> {
        self.check_failure()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let task = Task {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: description.map(String::from),
            completed: false,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        self.tasks.lock().await.insert(id, task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, TaskpilotError> {
        self.check_failure()?;
        Ok(self.list_all(user_id).await)
    }

    async fn complete_task(
        &self,
        user_id: &str,
        task_id: i64,
    ) -> Result<Option<Task>, TaskpilotError> {
        self.check_failure()?;
        let mut tasks = self.tasks.lock().await;
        match tasks.get_mut(&task_id) {
            Some(task) if task.user_id == user_id => {
                task.completed = true;
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(
        &self,
        user_id: &str,
        task_id: i64,
    ) -> Result<Option<Task>, TaskpilotError> {
        self.check_failure()?;
        let mut tasks = self.tasks.lock().await;
        match tasks.get(&task_id) {
            Some(task) if task.user_id == user_id => Ok(tasks.remove(&task_id)),
            _ => Ok(None),
        }
    }

    async fn rename_task(
        &self,
        user_id: &str,
        task_id: i64,
        new_title: &str,
    ) -> Result<Option<(String, Task)>, TaskpilotError> {
        self.check_failure()?;
        let mut tasks = self.tasks.lock().await;
        match tasks.get_mut(&task_id) {
            Some(task) if task.user_id == user_id => {
                let old_title = std::mem::replace(&mut task.title, new_title.to_string());
                Ok(Some((old_title, task.clone())))
            }
            _ => Ok(None),
        }
    }
}
