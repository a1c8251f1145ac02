//! Callback payload codec
//!
//! Payloads are colon-delimited: `action:arg1:arg2...`.

use crate::db::TaskId;
use std::fmt;

const DELIMITER: char = ':';

/// Decoded inline-button payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Menu,
    List { page: usize },
    Task { task_id: TaskId },
    Create,
    Edit { task_id: TaskId },
    Delete { task_id: TaskId },
    Cancel,
    Assignee { name: String },
}

impl Callback {
    /// Decode a payload; wrong argument counts and unparsable numbers yield `None`
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(DELIMITER);
        let action = parts.next()?;
        let args: Vec<&str> = parts.collect();

        match (action, args.as_slice()) {
            ("menu", []) => Some(Callback::Menu),
            ("list", []) => Some(Callback::List { page: 0 }),
            ("list", [page]) => page.parse().ok().map(|page| Callback::List { page }),
            ("task", [id]) => id.parse().ok().map(|task_id| Callback::Task { task_id }),
            ("create", []) => Some(Callback::Create),
            ("edit", [id]) => id.parse().ok().map(|task_id| Callback::Edit { task_id }),
            ("delete", [id]) => id.parse().ok().map(|task_id| Callback::Delete { task_id }),
            ("cancel", []) => Some(Callback::Cancel),
            ("assignee", [name]) if !name.trim().is_empty() => Some(Callback::Assignee {
                name: (*name).to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Menu => f.write_str("menu"),
            Callback::List { page } => write!(f, "list{DELIMITER}{page}"),
            Callback::Task { task_id } => write!(f, "task{DELIMITER}{task_id}"),
            Callback::Create => f.write_str("create"),
            Callback::Edit { task_id } => write!(f, "edit{DELIMITER}{task_id}"),
            Callback::Delete { task_id } => write!(f, "delete{DELIMITER}{task_id}"),
            Callback::Cancel => f.write_str("cancel"),
            Callback::Assignee { name } => write!(f, "assignee{DELIMITER}{name}"),
        }
    }
}
