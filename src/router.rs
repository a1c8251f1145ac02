//! Event router
//!
//! Classifies each Bot API update as a command, free text or a button
//! callback, and decides whether it goes to the dialogue state machine or
//! straight to a stateless handler.

mod callback;

pub use callback::Callback;

use crate::db::UserId;
use crate::render::ViewRequest;
use crate::state_machine::{Effect, Event};
use crate::telegram::Update;

/// Stateless slash commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Menu,
    Help,
    List,
}

impl Command {
    /// Exact-name lookup; `name` has no leading slash or `@bot` suffix
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start" | "menu" => Some(Command::Menu),
            "help" => Some(Command::Help),
            "tasks" | "list" => Some(Command::List),
            _ => None,
        }
    }

    pub fn view(self) -> ViewRequest {
        match self {
            Command::Menu => ViewRequest::MainMenu,
            Command::Help => ViewRequest::Help,
            Command::List => ViewRequest::TaskList { page: 0 },
        }
    }
}

/// Where the update came from, which decides send vs. edit-in-place
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Message,
    Callback { query_id: String, message_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Command name without slash or `@bot` suffix
    Command(String),
    Text(String),
    /// Raw callback payload
    Callback(String),
    /// The bot itself was added to a group
    Joined,
}

/// A classified update from a known user in a known chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: UserId,
    pub chat_id: i64,
    pub origin: Origin,
    pub kind: InboundKind,
}

/// Classify an update; updates without a sender, chat or content yield `None`
pub fn classify(update: &Update, bot_username: Option<&str>) -> Option<Inbound> {
    if let Some(query) = &update.callback_query {
        let message = query.message.as_ref()?;
        return Some(Inbound {
            user_id: query.from.id,
            chat_id: message.chat.id,
            origin: Origin::Callback {
                query_id: query.id.clone(),
                message_id: message.message_id,
            },
            kind: InboundKind::Callback(query.data.clone()?),
        });
    }

    let message = update.message.as_ref()?;
    let user_id = message.from.as_ref()?.id;

    let joined = message.new_chat_members.iter().flatten().any(|member| {
        member.is_bot && bot_username.is_some() && member.username.as_deref() == bot_username
    });
    let kind = if joined {
        InboundKind::Joined
    } else {
        let text = message.text.as_deref()?;
        match text.strip_prefix('/') {
            Some(command) => InboundKind::Command(command_name(command).to_string()),
            None => InboundKind::Text(text.to_string()),
        }
    };

    Some(Inbound {
        user_id,
        chat_id: message.chat.id,
        origin: Origin::Message,
        kind,
    })
}

/// Who sent the update, even when it carries nothing `classify` can use
pub fn sender(update: &Update) -> Option<UserId> {
    match &update.callback_query {
        Some(query) => Some(query.from.id),
        None => Some(update.message.as_ref()?.from.as_ref()?.id),
    }
}

/// `tasks@family_bot extra words` -> `tasks`
fn command_name(command: &str) -> &str {
    let word = command.split_whitespace().next().unwrap_or_default();
    word.split('@').next().unwrap_or_default()
}

/// Why an update was dropped without output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    UnknownCommand,
    IdleText,
    MalformedCallback,
}

/// What to do with a classified update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Execute directly, without touching the dialogue
    Effect(Effect),
    /// Abandon any dialogue in progress, then show the view
    Command(ViewRequest),
    /// Feed to the dialogue state machine
    Dialogue(Event),
    Ignore(Ignored),
}

/// Route an update given whether its sender's session is idle
pub fn route(kind: &InboundKind, session_idle: bool) -> Route {
    match kind {
        InboundKind::Command(name) => match Command::parse(name) {
            Some(command) => Route::Command(command.view()),
            None => Route::Ignore(Ignored::UnknownCommand),
        },
        InboundKind::Text(_) if session_idle => Route::Ignore(Ignored::IdleText),
        InboundKind::Text(text) => Route::Dialogue(Event::Text { text: text.clone() }),
        InboundKind::Callback(data) => match Callback::parse(data) {
            Some(callback) => route_callback(callback),
            None => Route::Ignore(Ignored::MalformedCallback),
        },
        InboundKind::Joined => Route::Effect(Effect::Show(ViewRequest::Greeting)),
    }
}

fn route_callback(callback: Callback) -> Route {
    match callback {
        Callback::Menu => Route::Effect(Effect::Show(ViewRequest::MainMenu)),
        Callback::List { page } => Route::Effect(Effect::Show(ViewRequest::TaskList { page })),
        Callback::Task { task_id } => {
            Route::Effect(Effect::Show(ViewRequest::TaskDetail { task_id }))
        }
        Callback::Delete { task_id } => Route::Effect(Effect::DeleteTask { task_id }),
        Callback::Create => Route::Dialogue(Event::BeginCreate),
        Callback::Edit { task_id } => Route::Dialogue(Event::BeginEdit { task_id }),
        Callback::Cancel => Route::Dialogue(Event::Cancel),
        Callback::Assignee { name } => Route::Dialogue(Event::AssigneePicked { name }),
    }
}
