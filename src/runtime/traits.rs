//! Trait abstractions for runtime I/O
//!
//! These traits let the dispatcher run against in-memory mocks in tests.

use crate::db::{Database, DbError, NewTask, Task, TaskEdit, TaskId, UserId};
use crate::render::View;
use crate::telegram::{TelegramClient, Update};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Task {0} not found")]
    NotFound(TaskId),
    #[error("{0}")]
    Backend(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::TaskNotFound(id) => StoreError::NotFound(id),
            DbError::Sqlite(e) => StoreError::Backend(e.to_string()),
        }
    }
}

/// Durable task storage
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: &NewTask) -> Result<TaskId, StoreError>;

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// All tasks, newest first
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    async fn update(&self, id: TaskId, edit: &TaskEdit) -> Result<(), StoreError>;

    async fn delete(&self, id: TaskId) -> Result<(), StoreError>;
}

/// Outbound chat messages
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, view: &View) -> Result<(), String>;

    async fn edit_message(&self, chat_id: i64, message_id: i64, view: &View)
        -> Result<(), String>;

    /// Stop the client-side spinner on a pressed button
    async fn answer_callback(&self, query_id: &str) -> Result<(), String>;
}

/// Who may talk to the bot
pub trait AllowList: Send + Sync {
    fn is_allowed(&self, user_id: UserId) -> bool;
}

/// Source of updates for long polling
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Next batch of updates with `update_id >= offset`; may block until one arrives
    async fn fetch(&self, offset: i64) -> Result<Vec<Update>, String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TaskStore + ?Sized> TaskStore for Arc<T> {
    async fn create(&self, task: &NewTask) -> Result<TaskId, StoreError> {
        (**self).create(task).await
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        (**self).list().await
    }

    async fn update(&self, id: TaskId, edit: &TaskEdit) -> Result<(), StoreError> {
        (**self).update(id, edit).await
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_message(&self, chat_id: i64, view: &View) -> Result<(), String> {
        (**self).send_message(chat_id, view).await
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        view: &View,
    ) -> Result<(), String> {
        (**self).edit_message(chat_id, message_id, view).await
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), String> {
        (**self).answer_callback(query_id).await
    }
}

impl<T: AllowList + ?Sized> AllowList for Arc<T> {
    fn is_allowed(&self, user_id: UserId) -> bool {
        (**self).is_allowed(user_id)
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as `TaskStore`
#[derive(Clone)]
pub struct DatabaseStore {
    db: Database,
}

impl DatabaseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for DatabaseStore {
    async fn create(&self, task: &NewTask) -> Result<TaskId, StoreError> {
        Ok(self.db.create_task(task)?)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.db.get_task(id)?)
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.db.list_tasks()?)
    }

    async fn update(&self, id: TaskId, edit: &TaskEdit) -> Result<(), StoreError> {
        Ok(self.db.update_task(id, edit)?)
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        Ok(self.db.delete_task(id)?)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, view: &View) -> Result<(), String> {
        let sent = TelegramClient::send_message(self, chat_id, view)
            .await
            .map_err(|e| e.to_string())?;
        tracing::debug!(chat_id, message_id = sent.message_id, "Message sent");
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        view: &View,
    ) -> Result<(), String> {
        TelegramClient::edit_message(self, chat_id, message_id, view)
            .await
            .map_err(|e| e.to_string())
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), String> {
        self.answer_callback_query(query_id)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch(&self, offset: i64) -> Result<Vec<Update>, String> {
        self.get_updates(offset).await.map_err(|e| e.to_string())
    }
}

/// Fixed set of user ids; an empty set admits nobody
#[derive(Debug, Clone, Default)]
pub struct StaticAllowList {
    ids: HashSet<UserId>,
}

impl StaticAllowList {
    pub fn new(ids: HashSet<UserId>) -> Self {
        Self { ids }
    }
}

impl AllowList for StaticAllowList {
    fn is_allowed(&self, user_id: UserId) -> bool {
        self.ids.contains(&user_id)
    }
}
