// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits: lifecycle, conversation persistence, and the task store.
//!
//! Every task-store operation takes `user_id` as an explicit parameter; the
//! implementation must carry it in the query predicate itself, never as an
//! after-the-fact filter. A task belonging to another user is
//! indistinguishable from a missing one.

use async_trait::async_trait;

use crate::error::TaskpilotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Conversation, Message, Task};

/// Lifecycle management for a persistence backend.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), TaskpilotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), TaskpilotError>;
}

/// Persistence for conversations and their append-only message history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates a new conversation. The conversation must exist before any
    /// message referencing it is written.
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), TaskpilotError>;

    /// Fetches a conversation by id.
    async fn get_conversation(
        &self,
        id: &str,
    ) -> Result<Option<Conversation>, TaskpilotError>;

    /// Appends a message to a conversation.
    async fn insert_message(&self, message: &Message) -> Result<(), TaskpilotError>;

    /// Returns messages for a conversation in chronological order.
    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, TaskpilotError>;
}

/// The durable task store, scoped by owner on every operation.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a task owned by `user_id` and returns the stored record.
    async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, TaskpilotError>;

    /// Returns all tasks owned by `user_id`.
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, TaskpilotError>;

    /// Sets `completed = true` on the task if it belongs to `user_id`.
    /// Returns the updated task, or `None` when no owned task matches.
    async fn complete_task(
        &self,
        user_id: &str,
        task_id: i64,
    ) -> Result<Option<Task>, TaskpilotError>;

    /// Deletes the task if it belongs to `user_id`. Returns the deleted
    /// task, or `None` when no owned task matches.
    async fn delete_task(
        &self,
        user_id: &str,
        task_id: i64,
    ) -> Result<Option<Task>, TaskpilotError>;

    /// Renames the task if it belongs to `user_id`. Returns the previous
    /// title and the updated task, or `None` when no owned task matches.
    async fn rename_task(
        &self,
        user_id: &str,
        task_id: i64,
        new_title: &str,
    ) -> Result<Option<(String, Task)>, TaskpilotError>;
}
