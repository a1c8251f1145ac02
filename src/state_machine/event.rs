//! Events that drive a user's dialogue

use crate::db::TaskId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Entry points (button presses)
    BeginCreate,
    BeginEdit { task_id: TaskId },
    Cancel,

    /// A recognized command arrived; any dialogue in progress is abandoned
    Interrupt,

    // Answers
    Text { text: String },
    /// Assignee chosen from the roster keyboard
    AssigneePicked { name: String },

    // Runtime feedback
    /// The task being edited no longer exists
    TaskMissing { task_id: TaskId },
}
