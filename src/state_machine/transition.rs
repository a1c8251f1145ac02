//! Pure state transition function
//!
//! Creation flow: title -> description -> reward -> assignee -> persist.
//! Edit flow: the same four questions for an existing task, then one update.
//! Nothing is written to the task store before the last answer, so abandoning
//! a flow never leaves a half-written task behind.

use super::{DialogueContext, DialogueState, Effect, Event, Field, Session};
use crate::render::{Notice, Prompt, ViewRequest};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Events that make no sense in the current state; the runtime drops them
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No dialogue in progress")]
    NotAwaitingInput,
    #[error("Assignee picked outside the assignee step")]
    UnexpectedAssignee,
    #[error("Not-found report for task {0} does not match the current dialogue")]
    StaleTaskMissing(i64),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    session: &Session,
    context: &DialogueContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&session.state, event) {
        // ============================================================
        // Entry points: overwrite whatever was in progress
        // ============================================================
        (_, Event::BeginCreate) => {
            let state = DialogueState::AwaitingTitle;
            Ok(TransitionResult::new(Session::entering(state))
                .with_effect(Effect::prompt(Prompt::Create(Field::Title))))
        }

        (_, Event::BeginEdit { task_id }) => {
            let state = DialogueState::Editing {
                task_id,
                field: Field::Title,
            };
            Ok(TransitionResult::new(Session::entering(state))
                .with_effect(Effect::prompt(Prompt::Edit(Field::Title))))
        }

        (_, Event::Cancel) => Ok(TransitionResult::new(Session::default())
            .with_effect(Effect::Show(ViewRequest::MainMenu))),

        (_, Event::Interrupt) => Ok(TransitionResult::new(Session::default())),

        // ============================================================
        // Answers
        // ============================================================
        (DialogueState::Idle, Event::Text { .. }) => Err(TransitionError::NotAwaitingInput),

        (state, Event::Text { text }) => {
            let blank = text.trim().is_empty();
            if blank && state.awaited_field().is_some_and(Field::is_required) {
                return Ok(ask_again(session));
            }
            Ok(answer(session, context, &text))
        }

        (state, Event::AssigneePicked { name })
            if state.awaited_field() == Some(Field::Assignee) =>
        {
            Ok(answer(session, context, &name))
        }

        (_, Event::AssigneePicked { .. }) => Err(TransitionError::UnexpectedAssignee),

        // ============================================================
        // Runtime feedback
        // ============================================================
        (state, Event::TaskMissing { task_id }) if state.editing_task() == Some(task_id) => {
            Ok(TransitionResult::new(Session::default())
                .with_effect(Effect::notice(Notice::TaskNotFound)))
        }

        (_, Event::TaskMissing { task_id }) => Err(TransitionError::StaleTaskMissing(task_id)),
    }
}

/// Keep the session and repeat the question after a blank required answer
fn ask_again(session: &Session) -> TransitionResult {
    let mut result = TransitionResult::new(session.clone())
        .with_effect(Effect::notice(Notice::BlankAnswer));
    if let Some(prompt) = session.state.prompt() {
        result = result.with_effect(Effect::prompt(prompt));
    }
    result
}

/// Record an answer for the awaited field, as typed, and move forward
fn answer(session: &Session, context: &DialogueContext, text: &str) -> TransitionResult {
    let Some(field) = session.state.awaited_field() else {
        return TransitionResult::new(Session::default());
    };

    let mut draft = session.draft.clone();
    draft.set(field, text);

    if let Some(next) = session.state.advanced() {
        let mut result = TransitionResult::new(Session {
            state: next.clone(),
            draft,
        });
        // The edit flow confirms its target still exists after the first answer
        if let (DialogueState::Editing { task_id, .. }, Field::Title) = (&session.state, field) {
            result = result.with_effect(Effect::EnsureTaskExists { task_id: *task_id });
        }
        if let Some(prompt) = next.prompt() {
            result = result.with_effect(Effect::prompt(prompt));
        }
        return result;
    }

    // Final answer: the session is cleared before the commit runs, so a
    // failing store never strands the user inside the flow
    let idle = TransitionResult::new(Session::default());
    match session.state.editing_task() {
        Some(task_id) => match draft.to_edit() {
            Some(edit) => idle.with_effect(Effect::UpdateTask { task_id, edit }),
            None => idle.with_effect(Effect::notice(Notice::UpdateFailed)),
        },
        None => match draft.to_new_task(context.user_id) {
            Some(task) => idle.with_effect(Effect::CreateTask { task }),
            None => idle.with_effect(Effect::notice(Notice::CreateFailed)),
        },
    }
}
