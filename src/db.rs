//! Database module for the task bot
//!
//! Provides persistence for household tasks.

mod schema;

pub use schema::*;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),
}

pub type DbResult<T> = Result<T, DbError>;

const TASK_COLUMNS: &str =
    "id, title, description, reward, assignee, created_by, created_at";

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Task Operations ====================

    /// Insert a task, returning the store-assigned id
    pub fn create_task(&self, task: &NewTask) -> DbResult<TaskId> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO tasks (title, description, reward, assignee, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.title,
                task.description,
                task.reward,
                task.assignee,
                task.created_by
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get task by ID; a missing row is `Ok(None)`
    pub fn get_task(&self, id: TaskId) -> DbResult<Option<Task>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;

        match stmt.query_row(params![id], row_to_task) {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::Sqlite(e)),
        }
    }

    /// List all tasks, newest first
    pub fn list_tasks(&self) -> DbResult<Vec<Task>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map([], row_to_task)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Overwrite the editable fields of a task
    pub fn update_task(&self, id: TaskId, edit: &TaskEdit) -> DbResult<()> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, reward = ?3, assignee = ?4
             WHERE id = ?5",
            params![edit.title, edit.description, edit.reward, edit.assignee, id],
        )?;

        if updated == 0 {
            return Err(DbError::TaskNotFound(id));
        }
        Ok(())
    }

    /// Delete a task
    pub fn delete_task(&self, id: TaskId) -> DbResult<()> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;

        if deleted == 0 {
            return Err(DbError::TaskNotFound(id));
        }
        Ok(())
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        reward: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        assignee: row.get(4)?,
        created_by: row.get(5)?,
        created_at: parse_timestamp(row.get::<_, Option<String>>(6)?.as_deref()),
    })
}

/// `CURRENT_TIMESTAMP` is UTC text: `YYYY-MM-DD HH:MM:SS`
fn parse_timestamp(s: Option<&str>) -> DateTime<Utc> {
    s.and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
        .map_or_else(Utc::now, |naive| naive.and_utc())
}
