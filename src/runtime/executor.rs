//! Update dispatcher
//!
//! Turns one Bot API update into state transitions and executed effects.
//! Nothing escapes `handle_update`: failures are logged and, where the user
//! should know, rendered as a notice.

use super::traits::{AllowList, Messenger, StoreError, TaskStore};
use crate::db::{NewTask, TaskEdit, TaskId, UserId};
use crate::render::{self, Notice, View, ViewRequest};
use crate::router::{classify, route, sender, Inbound, Origin, Route};
use crate::session::SessionStore;
use crate::state_machine::{Effect, Event};
use crate::telegram::Update;

/// Generic dispatcher that can work with any store, messenger and allow list
pub struct Dispatcher<S, M, A>
where
    S: TaskStore,
    M: Messenger,
    A: AllowList,
{
    store: S,
    messenger: M,
    allow_list: A,
    sessions: SessionStore,
    roster: Vec<String>,
    bot_username: Option<String>,
}

impl<S, M, A> Dispatcher<S, M, A>
where
    S: TaskStore,
    M: Messenger,
    A: AllowList,
{
    pub fn new(store: S, messenger: M, allow_list: A, roster: Vec<String>) -> Self {
        Self {
            store,
            messenger,
            allow_list,
            sessions: SessionStore::new(),
            roster,
            bot_username: None,
        }
    }

    /// Username used to recognize the bot being added to a group
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    #[cfg(test)]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn handle_update(&self, update: &Update) {
        let Some(inbound) = classify(update, self.bot_username.as_deref()) else {
            match sender(update) {
                Some(user_id) if !self.allow_list.is_allowed(user_id) => {
                    tracing::warn!(user_id, "Dropping update from user not on the allow list");
                }
                user_id => {
                    tracing::debug!(
                        update_id = update.update_id,
                        ?user_id,
                        "Ignoring update without usable content"
                    );
                }
            }
            return;
        };
        let Inbound {
            user_id,
            chat_id,
            origin,
            kind,
        } = inbound;

        if !self.allow_list.is_allowed(user_id) {
            tracing::warn!(user_id, chat_id, "Dropping update from user not on the allow list");
            return;
        }

        if let Origin::Callback { query_id, .. } = &origin {
            if let Err(e) = self.messenger.answer_callback(query_id).await {
                tracing::warn!(user_id, error = %e, "Failed to answer callback query");
            }
        }

        let mut delivery = Delivery::new(chat_id, &origin);
        match route(&kind, self.sessions.is_idle(user_id)) {
            Route::Ignore(reason) => {
                tracing::debug!(user_id, chat_id, ?reason, "Ignoring update");
            }
            Route::Effect(effect) => {
                self.execute_effects(user_id, vec![effect], &mut delivery)
                    .await;
            }
            Route::Command(view) => {
                self.process_event(user_id, Event::Interrupt, &mut delivery)
                    .await;
                self.execute_effects(user_id, vec![Effect::Show(view)], &mut delivery)
                    .await;
            }
            Route::Dialogue(event) => {
                self.process_event(user_id, event, &mut delivery).await;
            }
        }
    }

    async fn process_event(&self, user_id: UserId, event: Event, delivery: &mut Delivery) {
        // Guard effects may feed a follow-up event back in
        let mut events_to_process = vec![event];

        while let Some(event) = events_to_process.pop() {
            let effects = match self.sessions.advance(user_id, event) {
                Ok(effects) => effects,
                Err(e) => {
                    tracing::debug!(user_id, error = %e, "Dropping dialogue event");
                    return;
                }
            };

            if let Some(generated) = self.execute_effects(user_id, effects, delivery).await {
                events_to_process.push(generated);
            }
        }
    }

    /// Execute effects in order; a failed guard stops the batch and returns
    /// the event describing why
    async fn execute_effects(
        &self,
        user_id: UserId,
        effects: Vec<Effect>,
        delivery: &mut Delivery,
    ) -> Option<Event> {
        for effect in effects {
            match effect {
                Effect::Show(request) => self.show(request, delivery).await,

                Effect::EnsureTaskExists { task_id } => match self.store.get(task_id).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        tracing::info!(user_id, task_id, "Edited task no longer exists");
                        return Some(Event::TaskMissing { task_id });
                    }
                    Err(e) => {
                        tracing::error!(user_id, task_id, error = %e, "Failed to load task");
                        self.sessions.clear(user_id);
                        self.show(ViewRequest::Notice(Notice::LoadFailed), delivery)
                            .await;
                        return None;
                    }
                },

                Effect::CreateTask { task } => self.create_task(&task, delivery).await,

                Effect::UpdateTask { task_id, edit } => {
                    self.update_task(user_id, task_id, &edit, delivery).await;
                }

                Effect::DeleteTask { task_id } => {
                    self.delete_task(user_id, task_id, delivery).await;
                }
            }
        }
        None
    }

    async fn create_task(&self, task: &NewTask, delivery: &mut Delivery) {
        match self.store.create(task).await {
            Ok(task_id) => {
                tracing::info!(task_id, user_id = task.created_by, "Task created");
                self.show(ViewRequest::Notice(Notice::TaskCreated(task_id)), delivery)
                    .await;
                self.show(ViewRequest::TaskList { page: 0 }, delivery).await;
            }
            Err(e) => {
                tracing::error!(user_id = task.created_by, error = %e, "Failed to create task");
                self.show(ViewRequest::Notice(Notice::CreateFailed), delivery)
                    .await;
            }
        }
    }

    async fn update_task(
        &self,
        user_id: UserId,
        task_id: TaskId,
        edit: &TaskEdit,
        delivery: &mut Delivery,
    ) {
        match self.store.update(task_id, edit).await {
            Ok(()) => {
                tracing::info!(task_id, user_id, "Task updated");
                self.show(ViewRequest::Notice(Notice::TaskUpdated), delivery)
                    .await;
                self.show(ViewRequest::TaskDetail { task_id }, delivery).await;
            }
            Err(StoreError::NotFound(_)) => {
                tracing::info!(task_id, user_id, "Task vanished before update");
                self.show(ViewRequest::Notice(Notice::TaskNotFound), delivery)
                    .await;
            }
            Err(e) => {
                tracing::error!(task_id, user_id, error = %e, "Failed to update task");
                self.show(ViewRequest::Notice(Notice::UpdateFailed), delivery)
                    .await;
            }
        }
    }

    async fn delete_task(&self, user_id: UserId, task_id: TaskId, delivery: &mut Delivery) {
        match self.store.delete(task_id).await {
            Ok(()) => {
                tracing::info!(task_id, user_id, "Task deleted");
                self.show(ViewRequest::Notice(Notice::TaskDeleted), delivery)
                    .await;
                self.show(ViewRequest::TaskList { page: 0 }, delivery).await;
            }
            Err(StoreError::NotFound(_)) => {
                self.show(ViewRequest::Notice(Notice::TaskNotFound), delivery)
                    .await;
            }
            Err(e) => {
                tracing::error!(task_id, user_id, error = %e, "Failed to delete task");
                self.show(ViewRequest::Notice(Notice::DeleteFailed), delivery)
                    .await;
            }
        }
    }

    async fn show(&self, request: ViewRequest, delivery: &mut Delivery) {
        let view = self.render(request).await;
        delivery.deliver(&self.messenger, &view).await;
    }

    async fn render(&self, request: ViewRequest) -> View {
        match request {
            ViewRequest::MainMenu => render::main_menu(),
            ViewRequest::Help => render::help(),
            ViewRequest::Greeting => render::greeting(),
            ViewRequest::Prompt(prompt) => render::prompt(prompt, &self.roster),
            ViewRequest::Notice(notice) => render::notice(notice),
            ViewRequest::TaskList { page } => match self.store.list().await {
                Ok(tasks) => render::task_list(&tasks, page),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to list tasks");
                    render::notice(Notice::LoadFailed)
                }
            },
            ViewRequest::TaskDetail { task_id } => match self.store.get(task_id).await {
                Ok(task) => render::task_detail(task.as_ref()),
                Err(e) => {
                    tracing::error!(task_id, error = %e, "Failed to load task");
                    render::notice(Notice::LoadFailed)
                }
            },
        }
    }
}

/// Where the views of one update go: the first view of a button press
/// replaces the pressed message, everything else is a new message
struct Delivery {
    chat_id: i64,
    edit_target: Option<i64>,
}

impl Delivery {
    fn new(chat_id: i64, origin: &Origin) -> Self {
        let edit_target = match origin {
            Origin::Message => None,
            Origin::Callback { message_id, .. } => Some(*message_id),
        };
        Self {
            chat_id,
            edit_target,
        }
    }

    async fn deliver<M: Messenger>(&mut self, messenger: &M, view: &View) {
        let result = match self.edit_target.take() {
            Some(message_id) => messenger.edit_message(self.chat_id, message_id, view).await,
            None => messenger.send_message(self.chat_id, view).await,
        };
        if let Err(e) = result {
            tracing::warn!(chat_id = self.chat_id, error = %e, "Failed to deliver message");
        }
    }
}
