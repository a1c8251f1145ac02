//! Menu renderer
//!
//! Pure functions from a view request (plus whatever data it needs) to the
//! text and inline keyboard shown to the user. The same `View` is used
//! whether it is sent as a new message or edited into an existing one.

mod keyboard;

pub use keyboard::{Button, Keyboard};

use crate::db::{Task, TaskId};
use crate::lang;
use crate::router::Callback;
use crate::state_machine::Field;
use std::fmt::Write as _;

/// Tasks shown per list page
pub const PAGE_SIZE: usize = 5;

/// Views the runtime can be asked to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRequest {
    MainMenu,
    Help,
    /// Greeting posted when the bot joins a group
    Greeting,
    TaskList { page: usize },
    TaskDetail { task_id: TaskId },
    Prompt(Prompt),
    Notice(Notice),
}

/// Question asked at a dialogue step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Create(Field),
    Edit(Field),
}

impl Prompt {
    pub fn field(self) -> Field {
        match self {
            Prompt::Create(field) | Prompt::Edit(field) => field,
        }
    }
}

/// One-line outcome messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    TaskCreated(TaskId),
    TaskUpdated,
    TaskDeleted,
    TaskNotFound,
    CreateFailed,
    UpdateFailed,
    DeleteFailed,
    LoadFailed,
    /// A required answer was blank
    BlankAnswer,
}

/// Rendered output: message text plus optional inline keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl View {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

// ============================================================================
// Views
// ============================================================================

pub fn main_menu() -> View {
    View::with_keyboard(
        lang::MAIN_MENU,
        Keyboard::new()
            .row(vec![Button::new(
                lang::BUTTON_TASK_LIST,
                &Callback::List { page: 0 },
            )])
            .row(vec![Button::new(lang::BUTTON_CREATE, &Callback::Create)]),
    )
}

pub fn help() -> View {
    View::with_keyboard(lang::HELP, back_to_menu())
}

/// Resolve the page to show; out-of-range pages fall back to the first page
pub fn clamp_page(page: usize, total: usize) -> usize {
    if page.saturating_mul(PAGE_SIZE) >= total {
        0
    } else {
        page
    }
}

/// Paginated task list, `tasks` in display order
pub fn task_list(tasks: &[Task], page: usize) -> View {
    if tasks.is_empty() {
        return View::with_keyboard(lang::NO_TASKS, back_to_menu());
    }

    let page = clamp_page(page, tasks.len());
    let start = page * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(tasks.len());
    let visible = &tasks[start..end];

    let mut text = format!("{}\n\n", lang::TASK_LIST_HEADER);
    for task in visible {
        let _ = writeln!(text, "{}. {} (for {})", task.id, task.title, task.assignee);
    }

    let mut keyboard = Keyboard::new();
    for task in visible {
        keyboard = keyboard.row(vec![Button::new(
            format!("{}. {}", task.id, task.title),
            &Callback::Task { task_id: task.id },
        )]);
    }

    let mut pagination = vec![];
    if page > 0 {
        pagination.push(Button::new(
            lang::BUTTON_PREVIOUS,
            &Callback::List { page: page - 1 },
        ));
    }
    if end < tasks.len() {
        pagination.push(Button::new(
            lang::BUTTON_NEXT,
            &Callback::List { page: page + 1 },
        ));
    }

    let keyboard = keyboard
        .row(pagination)
        .row(vec![Button::new(lang::BUTTON_TO_MENU, &Callback::Menu)]);

    View::with_keyboard(text, keyboard)
}

/// Task detail; a missing task renders the not-found view
pub fn task_detail(task: Option<&Task>) -> View {
    let Some(task) = task else {
        return not_found();
    };

    let text = format!(
        "📌 Task #{}\n\n\
         🔹 Title: {}\n\
         🔹 Description: {}\n\
         🔹 Reward: {}\n\
         🔹 Assignee: {}\n\
         🔹 Created: {}\n",
        task.id,
        task.title,
        task.description,
        task.reward,
        task.assignee,
        task.created_at.format("%d.%m.%Y %H:%M"),
    );

    let keyboard = Keyboard::new()
        .row(vec![
            Button::new(lang::BUTTON_EDIT, &Callback::Edit { task_id: task.id }),
            Button::new(lang::BUTTON_DELETE, &Callback::Delete { task_id: task.id }),
        ])
        .row(vec![Button::new(
            lang::BUTTON_TO_LIST,
            &Callback::List { page: 0 },
        )]);

    View::with_keyboard(text, keyboard)
}

/// Dialogue question with the keyboard for its step
pub fn prompt(prompt: Prompt, roster: &[String]) -> View {
    let text = match prompt {
        Prompt::Create(Field::Title) => lang::PROMPT_TITLE,
        Prompt::Create(Field::Description) => lang::PROMPT_DESCRIPTION,
        Prompt::Create(Field::Reward) => lang::PROMPT_REWARD,
        Prompt::Create(Field::Assignee) => lang::PROMPT_ASSIGNEE,
        Prompt::Edit(Field::Title) => lang::PROMPT_NEW_TITLE,
        Prompt::Edit(Field::Description) => lang::PROMPT_NEW_DESCRIPTION,
        Prompt::Edit(Field::Reward) => lang::PROMPT_NEW_REWARD,
        Prompt::Edit(Field::Assignee) => lang::PROMPT_NEW_ASSIGNEE,
    };

    let keyboard = match prompt.field() {
        Field::Assignee => assignee_keyboard(roster),
        _ => cancel_keyboard(),
    };
    View::with_keyboard(text, keyboard)
}

pub fn notice(notice: Notice) -> View {
    match notice {
        Notice::TaskCreated(id) => View::text(lang::task_created(id)),
        Notice::TaskUpdated => View::text(lang::TASK_UPDATED),
        Notice::TaskDeleted => View::text(lang::TASK_DELETED),
        Notice::TaskNotFound => not_found(),
        Notice::CreateFailed => View::text(lang::CREATE_FAILED),
        Notice::UpdateFailed => View::text(lang::UPDATE_FAILED),
        Notice::DeleteFailed => View::text(lang::DELETE_FAILED),
        Notice::LoadFailed => View::text(lang::LOAD_FAILED),
        Notice::BlankAnswer => View::text(lang::BLANK_ANSWER),
    }
}

pub fn greeting() -> View {
    View::text(lang::BOT_ADDED_TO_GROUP)
}

// ============================================================================
// Keyboards
// ============================================================================

fn not_found() -> View {
    View::with_keyboard(lang::TASK_NOT_FOUND, back_to_menu())
}

fn back_to_menu() -> Keyboard {
    Keyboard::new().row(vec![Button::new(lang::BUTTON_TO_MENU, &Callback::Menu)])
}

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::new().row(vec![Button::new(lang::BUTTON_CANCEL, &Callback::Cancel)])
}

/// Static household roster, two per row, plus cancel
pub fn assignee_keyboard(roster: &[String]) -> Keyboard {
    let mut keyboard = Keyboard::new();
    for pair in roster.chunks(2) {
        keyboard = keyboard.row(
            pair.iter()
                .map(|name| Button::new(name.clone(), &Callback::Assignee { name: name.clone() }))
                .collect(),
        );
    }
    keyboard.row(vec![Button::new(lang::BUTTON_CANCEL, &Callback::Cancel)])
}
