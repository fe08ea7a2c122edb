// SPDX-FileCopyrightText: 2026 Taskpilot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use taskpilot_config::model::StorageConfig;
use taskpilot_core::types::{Conversation, Message, Task};
use taskpilot_core::{
    AdapterType, ConversationStore, HealthStatus, PluginAdapter, StorageAdapter,
    TaskStore, TaskpilotError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not
    /// initialized.
    fn db(&self) -> Result<&Database, TaskpilotError> {
        self.db.get().ok_or_else(|| TaskpilotError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TaskpilotError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TaskpilotError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), TaskpilotError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| TaskpilotError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), TaskpilotError> {
        self.db()?.close().await
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), TaskpilotError> {
        queries::conversations::create_conversation(self.db()?, conversation).await
    }

    async fn get_conversation(
        &self,
        id: &str,
    ) -> Result<Option<Conversation>, TaskpilotError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn insert_message(&self, message: &Message) -> Result<(), TaskpilotError> {
        let db = self.db()?;
        queries::messages::insert_message(db, message).await?;
        queries::conversations::touch_conversation(
            db,
            &message.conversation_id,
            &message.created_at,
        )
        .await
    }

    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, TaskpilotError> {
        queries::messages::get_messages_for_conversation(self.db()?, conversation_id, limit)
            .await
    }
}

#[async_trait]
impl TaskStore for SqliteStorage {
    async fn create_task(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, TaskpilotError> {
        queries::tasks::create_task(self.db()?, user_id, title, description, &Self::now())
            .await
    }

    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>, TaskpilotError> {
        queries::tasks::list_tasks(self.db()?, user_id).await
    }

    async fn complete_task(
        &self,
        user_id: &str,
        task_id: i64,
    ) -> Result<Option<Task>, TaskpilotError> {
        queries::tasks::complete_task(self.db()?, user_id, task_id, &Self::now()).await
    }

    async fn delete_task(
        &self,
        user_id: &str,
        task_id: i64,
    ) -> Result<Option<Task>, TaskpilotError> {
        queries::tasks::delete_task(self.db()?, user_id, task_id).await
    }

    async fn rename_task(
        &self,
        user_id: &str,
        task_id: i64,
        new_title: &str,
    ) -> Result<Option<(String, Task)>, TaskpilotError> {
        queries::tasks::rename_task(self.db()?, user_id, task_id, new_title, &Self::now())
            .await
    }
}
