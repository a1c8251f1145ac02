//! Database schema and types

use chrono::{DateTime, Utc};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    reward TEXT,
    assignee TEXT NOT NULL,
    created_by INTEGER NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at DESC);
";

/// Store-assigned task identifier
pub type TaskId = i64;

/// Telegram user identifier
pub type UserId = i64;

/// A persisted household task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub reward: String,
    pub assignee: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Apply the four editable fields, leaving identity and audit columns alone
    #[cfg(test)]
    pub fn apply(&mut self, edit: TaskEdit) {
        self.title = edit.title;
        self.description = edit.description;
        self.reward = edit.reward;
        self.assignee = edit.assignee;
    }
}

/// Fields collected by the creation dialogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub reward: String,
    pub assignee: String,
    pub created_by: UserId,
}

/// Replacement values collected by the edit dialogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: String,
    pub description: String,
    pub reward: String,
    pub assignee: String,
}
