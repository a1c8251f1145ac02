//! Dialogue state types

use crate::db::{NewTask, TaskEdit, TaskId, UserId};
use crate::render::Prompt;
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// Fields
// ============================================================================

/// The four user-entered task fields, in the order the dialogues ask for them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Description,
    Reward,
    Assignee,
}

impl Field {
    #[cfg(test)]
    pub const ALL: [Field; 4] = [
        Field::Title,
        Field::Description,
        Field::Reward,
        Field::Assignee,
    ];

    /// The field asked for after this one, `None` after the assignee
    pub fn next(self) -> Option<Self> {
        match self {
            Field::Title => Some(Field::Description),
            Field::Description => Some(Field::Reward),
            Field::Reward => Some(Field::Assignee),
            Field::Assignee => None,
        }
    }

    /// Title and assignee may not be blank; description and reward may
    pub fn is_required(self) -> bool {
        matches!(self, Field::Title | Field::Assignee)
    }
}

// ============================================================================
// Dialogue State
// ============================================================================

/// Where a user is in a multi-step dialogue
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueState {
    /// No dialogue in progress; free text is ignored
    #[default]
    Idle,

    // Creation flow
    AwaitingTitle,
    AwaitingDescription,
    AwaitingReward,
    AwaitingAssignee,

    /// Edit flow for an existing task, waiting for `field`
    Editing { task_id: TaskId, field: Field },
}

impl DialogueState {
    /// Creation-flow state waiting for `field`
    pub fn creating(field: Field) -> Self {
        match field {
            Field::Title => DialogueState::AwaitingTitle,
            Field::Description => DialogueState::AwaitingDescription,
            Field::Reward => DialogueState::AwaitingReward,
            Field::Assignee => DialogueState::AwaitingAssignee,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DialogueState::Idle)
    }

    /// The field the next free-text answer fills in
    pub fn awaited_field(&self) -> Option<Field> {
        match self {
            DialogueState::Idle => None,
            DialogueState::AwaitingTitle => Some(Field::Title),
            DialogueState::AwaitingDescription => Some(Field::Description),
            DialogueState::AwaitingReward => Some(Field::Reward),
            DialogueState::AwaitingAssignee => Some(Field::Assignee),
            DialogueState::Editing { field, .. } => Some(*field),
        }
    }

    /// State after the awaited field is answered; `None` when the answer completes the flow
    pub fn advanced(&self) -> Option<Self> {
        let next = self.awaited_field()?.next()?;
        match self {
            DialogueState::Editing { task_id, .. } => Some(DialogueState::Editing {
                task_id: *task_id,
                field: next,
            }),
            _ => Some(DialogueState::creating(next)),
        }
    }

    /// Question shown to the user while in this state
    pub fn prompt(&self) -> Option<Prompt> {
        match self {
            DialogueState::Idle => None,
            DialogueState::Editing { field, .. } => Some(Prompt::Edit(*field)),
            other => other.awaited_field().map(Prompt::Create),
        }
    }

    /// Task the edit flow targets
    pub fn editing_task(&self) -> Option<TaskId> {
        match self {
            DialogueState::Editing { task_id, .. } => Some(*task_id),
            _ => None,
        }
    }
}

// ============================================================================
// Draft (scratch pad)
// ============================================================================

/// Field values collected so far in the current dialogue, not yet persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    values: BTreeMap<Field, String>,
}

impl Draft {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Build the task to insert; `None` unless all four fields are present
    pub fn to_new_task(&self, created_by: UserId) -> Option<NewTask> {
        Some(NewTask {
            title: self.get(Field::Title)?.to_string(),
            description: self.get(Field::Description)?.to_string(),
            reward: self.get(Field::Reward)?.to_string(),
            assignee: self.get(Field::Assignee)?.to_string(),
            created_by,
        })
    }

    /// Build the field replacement; `None` unless all four fields are present
    pub fn to_edit(&self) -> Option<TaskEdit> {
        Some(TaskEdit {
            title: self.get(Field::Title)?.to_string(),
            description: self.get(Field::Description)?.to_string(),
            reward: self.get(Field::Reward)?.to_string(),
            assignee: self.get(Field::Assignee)?.to_string(),
        })
    }
}

// ============================================================================
// Session
// ============================================================================

/// Per-user dialogue session: state tag plus draft
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: DialogueState,
    pub draft: Draft,
}

impl Session {
    /// Fresh session entering `state` with an empty draft
    pub fn entering(state: DialogueState) -> Self {
        Self {
            state,
            draft: Draft::default(),
        }
    }

    /// Idle with nothing drafted
    pub fn is_idle(&self) -> bool {
        self.state.is_idle() && self.draft.is_empty()
    }
}

/// Immutable facts about the user driving the dialogue
#[derive(Debug, Clone, Copy)]
pub struct DialogueContext {
    pub user_id: UserId,
}

impl DialogueContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
