//! Effects produced by state transitions

use crate::db::{NewTask, TaskEdit, TaskId};
use crate::render::{Notice, Prompt, ViewRequest};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Render a view to the user
    Show(ViewRequest),

    /// Guard: stop executing this transition's remaining effects and feed
    /// `Event::TaskMissing` back when the task is gone
    EnsureTaskExists { task_id: TaskId },

    /// Persist a completed creation draft
    CreateTask { task: NewTask },

    /// Persist a completed edit draft
    UpdateTask { task_id: TaskId, edit: TaskEdit },

    /// Remove a task
    DeleteTask { task_id: TaskId },
}

impl Effect {
    pub fn prompt(prompt: Prompt) -> Self {
        Effect::Show(ViewRequest::Prompt(prompt))
    }

    pub fn notice(notice: Notice) -> Self {
        Effect::Show(ViewRequest::Notice(notice))
    }

    /// Whether executing this effect writes to the task store
    #[cfg(test)]
    pub fn mutates_store(&self) -> bool {
        matches!(
            self,
            Effect::CreateTask { .. } | Effect::UpdateTask { .. } | Effect::DeleteTask { .. }
        )
    }
}
