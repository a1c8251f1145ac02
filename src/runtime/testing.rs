//! Mock implementations for testing
//!
//! These mocks enable end-to-end dispatcher tests without real I/O.

use super::traits::*;
use super::Dispatcher;
use crate::db::{NewTask, Task, TaskEdit, TaskId, UserId};
use crate::render::View;
use crate::state_machine::Session;
use crate::telegram::{CallbackQuery, Chat, Message, Update, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

// ============================================================================
// In-Memory Task Store
// ============================================================================

/// In-memory task store with switchable failure
pub struct InMemoryTaskStore {
    tasks: Mutex<BTreeMap<TaskId, Task>>,
    next_id: Mutex<TaskId>,
    failing: AtomicBool,
    /// Mutation attempts, successful or not
    writes: AtomicUsize,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(BTreeMap::new()),
            next_id: Mutex::new(1),
            failing: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent call fail with a backend error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().values().cloned().collect()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: &NewTask) -> Result<TaskId, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;

        self.tasks.lock().unwrap().insert(
            id,
            Task {
                id,
                title: task.title.clone(),
                description: task.description.clone(),
                reward: task.reward.clone(),
                assignee: task.assignee.clone(),
                created_by: task.created_by,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.check()?;
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.check()?;
        let mut tasks = self.snapshot();
        tasks.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(tasks)
    }

    async fn update(&self, id: TaskId, edit: &TaskEdit) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        task.apply(edit.clone());
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.tasks
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

// ============================================================================
// Recording Messenger
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Sent {
        chat_id: i64,
        view: View,
    },
    Edited {
        chat_id: i64,
        message_id: i64,
        view: View,
    },
    Answered {
        query_id: String,
    },
}

/// Messenger that records everything it is asked to deliver
#[derive(Default)]
pub struct RecordingMessenger {
    outbox: Mutex<Vec<Outbound>>,
}

impl RecordingMessenger {
    /// Drain recorded output
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.outbox.lock().unwrap())
    }

    /// Drain recorded output, keeping only rendered views
    pub fn take_views(&self) -> Vec<View> {
        self.take()
            .into_iter()
            .filter_map(|out| match out {
                Outbound::Sent { view, .. } | Outbound::Edited { view, .. } => Some(view),
                Outbound::Answered { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, chat_id: i64, view: &View) -> Result<(), String> {
        self.outbox.lock().unwrap().push(Outbound::Sent {
            chat_id,
            view: view.clone(),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        view: &View,
    ) -> Result<(), String> {
        self.outbox.lock().unwrap().push(Outbound::Edited {
            chat_id,
            message_id,
            view: view.clone(),
        });
        Ok(())
    }

    async fn answer_callback(&self, query_id: &str) -> Result<(), String> {
        self.outbox.lock().unwrap().push(Outbound::Answered {
            query_id: query_id.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Scripted Update Source
// ============================================================================

/// Replays queued batches, then cancels the token it was given
pub struct ScriptedSource {
    batches: Mutex<VecDeque<Result<Vec<Update>, String>>>,
    offsets: Mutex<Vec<i64>>,
    cancel: CancellationToken,
}

impl ScriptedSource {
    pub fn new(
        batches: Vec<Result<Vec<Update>, String>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            offsets: Mutex::new(Vec::new()),
            cancel,
        }
    }

    /// Offsets passed to each fetch
    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    async fn fetch(&self, offset: i64) -> Result<Vec<Update>, String> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(Err(e)) => {
                self.cancel.cancel();
                Err(e)
            }
            Some(Ok(batch)) => Ok(batch),
            None => {
                self.cancel.cancel();
                Ok(vec![])
            }
        }
    }
}

// ============================================================================
// Test Bot
// ============================================================================

pub const USER: UserId = 7;
pub const CHAT: i64 = 70;
pub const STRANGER: UserId = 666;
/// Message carrying the keyboard that was pressed
pub const PRESSED_MESSAGE: i64 = 500;
pub const BOT_USERNAME: &str = "family_bot";

pub type TestDispatcher =
    Dispatcher<Arc<InMemoryTaskStore>, Arc<RecordingMessenger>, StaticAllowList>;

/// Dispatcher wired to mocks, with update builders
pub struct TestBot {
    pub store: Arc<InMemoryTaskStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub dispatcher: TestDispatcher,
    next_update_id: AtomicI64,
}

impl TestBot {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let messenger = Arc::new(RecordingMessenger::default());
        let dispatcher = Dispatcher::new(
            store.clone(),
            messenger.clone(),
            StaticAllowList::new(HashSet::from([USER, USER + 1])),
            vec!["Husband".to_string(), "Wife".to_string()],
        )
        .with_bot_username(Some(BOT_USERNAME.to_string()));

        Self {
            store,
            messenger,
            dispatcher,
            next_update_id: AtomicI64::new(1),
        }
    }

    fn update_id(&self) -> i64 {
        self.next_update_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn text_update(&self, user_id: UserId, text: &str) -> Update {
        let update_id = self.update_id();
        Update {
            update_id,
            message: Some(Message {
                message_id: 1000 + update_id,
                from: Some(user(user_id)),
                chat: chat(),
                text: Some(text.to_string()),
                new_chat_members: None,
            }),
            callback_query: None,
        }
    }

    pub fn callback_update(&self, user_id: UserId, data: &str) -> Update {
        let update_id = self.update_id();
        Update {
            update_id,
            message: None,
            callback_query: Some(CallbackQuery {
                id: format!("query-{update_id}"),
                from: user(user_id),
                message: Some(Message {
                    message_id: PRESSED_MESSAGE,
                    chat: chat(),
                    ..Message::default()
                }),
                data: Some(data.to_string()),
            }),
        }
    }

    pub async fn text(&self, user_id: UserId, text: &str) {
        let update = self.text_update(user_id, text);
        self.dispatcher.handle_update(&update).await;
    }

    pub async fn press(&self, user_id: UserId, data: &str) {
        let update = self.callback_update(user_id, data);
        self.dispatcher.handle_update(&update).await;
    }

    pub fn session(&self, user_id: UserId) -> Session {
        self.dispatcher.sessions().get(user_id)
    }

    pub async fn seed(&self, title: &str, created_by: UserId) -> TaskId {
        self.store
            .create(&NewTask {
                title: title.to_string(),
                description: format!("{title} description"),
                reward: "Cake".to_string(),
                assignee: "Husband".to_string(),
                created_by,
            })
            .await
            .unwrap()
    }
}

impl Default for TestBot {
    fn default() -> Self {
        Self::new()
    }
}

fn user(id: UserId) -> User {
    User {
        id,
        ..User::default()
    }
}

fn chat() -> Chat {
    Chat { id: CHAT }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang;
    use crate::render::{self, Notice, Prompt};
    use crate::runtime::run_polling;
    use crate::state_machine::{DialogueState, Field};

    /// Drive a full creation dialogue, typing the assignee when given
    async fn create_via_dialogue(bot: &TestBot, typed_assignee: Option<&str>) {
        bot.press(USER, "create").await;
        bot.text(USER, "Wash dishes").await;
        bot.text(USER, "All of them").await;
        bot.text(USER, "Pizza").await;
        match typed_assignee {
            Some(name) => bot.text(USER, name).await,
            None => bot.press(USER, "assignee:Wife").await,
        }
    }

    #[tokio::test]
    async fn test_creation_flow_persists_task() {
        let bot = TestBot::new();
        create_via_dialogue(&bot, None).await;

        let tasks = bot.store.snapshot();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.title, "Wash dishes");
        assert_eq!(task.description, "All of them");
        assert_eq!(task.reward, "Pizza");
        assert_eq!(task.assignee, "Wife");
        assert_eq!(task.created_by, USER);
        assert!(bot.session(USER).is_idle());

        let out = bot.messenger.take();
        let roster = vec!["Husband".to_string(), "Wife".to_string()];
        let expected = vec![
            Outbound::Answered {
                query_id: "query-1".to_string(),
            },
            Outbound::Edited {
                chat_id: CHAT,
                message_id: PRESSED_MESSAGE,
                view: render::prompt(Prompt::Create(Field::Title), &roster),
            },
            Outbound::Sent {
                chat_id: CHAT,
                view: render::prompt(Prompt::Create(Field::Description), &roster),
            },
            Outbound::Sent {
                chat_id: CHAT,
                view: render::prompt(Prompt::Create(Field::Reward), &roster),
            },
            Outbound::Sent {
                chat_id: CHAT,
                view: render::prompt(Prompt::Create(Field::Assignee), &roster),
            },
            Outbound::Answered {
                query_id: "query-5".to_string(),
            },
            Outbound::Edited {
                chat_id: CHAT,
                message_id: PRESSED_MESSAGE,
                view: render::notice(Notice::TaskCreated(task.id)),
            },
            Outbound::Sent {
                chat_id: CHAT,
                view: render::task_list(&tasks, 0),
            },
        ];
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_typed_assignee_is_accepted() {
        let bot = TestBot::new();
        create_via_dialogue(&bot, Some("  Grandma ")).await;

        let tasks = bot.store.snapshot();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].assignee, "  Grandma ");
    }

    #[tokio::test]
    async fn test_answers_are_stored_as_typed() {
        let bot = TestBot::new();
        bot.press(USER, "create").await;
        bot.text(USER, "   ").await;
        assert_eq!(bot.session(USER).state, DialogueState::AwaitingTitle);
        assert_eq!(
            bot.messenger.take_views()[1..],
            [
                render::notice(Notice::BlankAnswer),
                render::prompt(Prompt::Create(Field::Title), &[]),
            ]
        );

        bot.text(USER, "  Vacuum  ").await;
        bot.text(USER, " ").await;
        assert_eq!(bot.session(USER).state, DialogueState::AwaitingReward);
        bot.text(USER, "Pizza").await;
        bot.text(USER, "Wife").await;

        let tasks = bot.store.snapshot();
        assert_eq!(tasks.len(), 1);
        assert_eq!(
            (
                tasks[0].title.as_str(),
                tasks[0].description.as_str(),
                tasks[0].reward.as_str(),
                tasks[0].assignee.as_str(),
            ),
            ("  Vacuum  ", " ", "Pizza", "Wife")
        );
    }

    #[tokio::test]
    async fn test_cancel_leaves_store_unchanged() {
        let bot = TestBot::new();
        bot.press(USER, "create").await;
        bot.text(USER, "Wash dishes").await;
        bot.text(USER, "All of them").await;
        bot.messenger.take();

        bot.press(USER, "cancel").await;

        assert_eq!(bot.store.write_count(), 0);
        assert!(bot.session(USER).is_idle());
        assert_eq!(bot.messenger.take_views(), vec![render::main_menu()]);

        // Later text goes nowhere
        bot.text(USER, "Pizza").await;
        assert!(bot.messenger.take().is_empty());
        assert!(bot.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_edit_keeps_identity_and_audit_fields() {
        let bot = TestBot::new();
        let id = bot.seed("Vacuum", USER + 1).await;
        let before = bot.store.get(id).await.unwrap().unwrap();

        bot.press(USER, &format!("edit:{id}")).await;
        bot.text(USER, "Vacuum upstairs").await;
        bot.text(USER, "Bedrooms only").await;
        bot.text(USER, "Movie night").await;
        bot.messenger.take();
        bot.press(USER, "assignee:Wife").await;

        let after = bot.store.get(id).await.unwrap().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_by, USER + 1);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.title, "Vacuum upstairs");
        assert_eq!(after.description, "Bedrooms only");
        assert_eq!(after.reward, "Movie night");
        assert_eq!(after.assignee, "Wife");
        assert_eq!(bot.store.snapshot().len(), 1);

        assert_eq!(
            bot.messenger.take_views(),
            vec![
                render::notice(Notice::TaskUpdated),
                render::task_detail(Some(&after)),
            ]
        );
        assert!(bot.session(USER).is_idle());
    }

    #[tokio::test]
    async fn test_edit_of_deleted_task_reports_not_found() {
        let bot = TestBot::new();
        let id = bot.seed("Vacuum", USER).await;

        bot.press(USER, &format!("edit:{id}")).await;
        bot.store.delete(id).await.unwrap();
        bot.messenger.take();

        bot.text(USER, "Vacuum upstairs").await;

        assert_eq!(
            bot.messenger.take_views(),
            vec![render::notice(Notice::TaskNotFound)]
        );
        assert!(bot.session(USER).is_idle());
    }

    #[tokio::test]
    async fn test_task_deleted_mid_edit_is_not_resurrected() {
        let bot = TestBot::new();
        let id = bot.seed("Vacuum", USER).await;

        bot.press(USER, &format!("edit:{id}")).await;
        bot.text(USER, "Vacuum upstairs").await;
        bot.text(USER, "Bedrooms only").await;
        bot.text(USER, "Movie night").await;
        bot.store.delete(id).await.unwrap();
        bot.messenger.take();

        bot.text(USER, "Wife").await;

        assert!(bot.store.snapshot().is_empty());
        assert_eq!(
            bot.messenger.take_views(),
            vec![render::notice(Notice::TaskNotFound)]
        );
        assert!(bot.session(USER).is_idle());
    }

    #[tokio::test]
    async fn test_out_of_range_page_shows_first_page() {
        let bot = TestBot::new();
        for title in ["A", "B", "C"] {
            bot.seed(title, USER).await;
        }
        let tasks = bot.store.list().await.unwrap();

        bot.press(USER, "list:9").await;

        assert_eq!(
            bot.messenger.take_views(),
            vec![render::task_list(&tasks, 0)]
        );
    }

    #[tokio::test]
    async fn test_missing_task_detail_renders_not_found() {
        let bot = TestBot::new();
        bot.press(USER, "task:42").await;

        let views = bot.messenger.take_views();
        assert_eq!(views, vec![render::task_detail(None)]);
        assert_eq!(views[0].text, lang::TASK_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_disallowed_user_gets_nothing() {
        let bot = TestBot::new();
        let id = bot.seed("Vacuum", USER).await;
        let writes = bot.store.write_count();

        bot.press(STRANGER, "create").await;
        bot.text(STRANGER, "Wash dishes").await;
        bot.press(STRANGER, &format!("delete:{id}")).await;
        bot.text(STRANGER, "/start").await;

        assert!(bot.messenger.take().is_empty());
        assert_eq!(bot.store.write_count(), writes);
        assert_eq!(bot.store.snapshot().len(), 1);
        assert!(bot.session(STRANGER).is_idle());
    }

    #[tokio::test]
    async fn test_unusable_callbacks_are_dropped_for_everyone() {
        let bot = TestBot::new();
        for user_id in [STRANGER, USER] {
            let mut without_data = bot.callback_update(user_id, "menu");
            if let Some(query) = without_data.callback_query.as_mut() {
                query.data = None;
            }
            let mut without_message = bot.callback_update(user_id, "create");
            if let Some(query) = without_message.callback_query.as_mut() {
                query.message = None;
            }

            bot.dispatcher.handle_update(&without_data).await;
            bot.dispatcher.handle_update(&without_message).await;
        }

        assert!(bot.messenger.take().is_empty());
        assert!(bot.session(USER).is_idle());
        assert!(bot.session(STRANGER).is_idle());
    }

    #[tokio::test]
    async fn test_command_mid_flow_clears_session() {
        let bot = TestBot::new();
        bot.press(USER, "create").await;
        bot.text(USER, "Wash dishes").await;
        bot.messenger.take();

        bot.text(USER, "/start").await;
        assert!(bot.session(USER).is_idle());
        assert_eq!(
            bot.messenger.take(),
            vec![Outbound::Sent {
                chat_id: CHAT,
                view: render::main_menu()
            }]
        );

        bot.text(USER, "All of them").await;
        assert!(bot.messenger.take().is_empty());
        assert!(bot.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_leaves_flow() {
        let bot = TestBot::new();
        bot.press(USER, "create").await;
        bot.messenger.take();

        bot.text(USER, "/init_chat").await;

        assert!(bot.messenger.take().is_empty());
        assert_eq!(bot.session(USER).state, DialogueState::AwaitingTitle);
    }

    #[tokio::test]
    async fn test_help_and_tasks_commands() {
        let bot = TestBot::new();
        bot.text(USER, "/help").await;
        bot.text(USER, "/tasks@family_bot").await;

        assert_eq!(
            bot.messenger.take_views(),
            vec![render::help(), render::task_list(&[], 0)]
        );
    }

    #[tokio::test]
    async fn test_malformed_callbacks_are_only_acknowledged() {
        let bot = TestBot::new();
        for data in ["list:abc", "task", "edit:x", "bogus"] {
            bot.press(USER, data).await;
        }

        let out = bot.messenger.take();
        assert_eq!(out.len(), 4);
        assert!(out
            .iter()
            .all(|o| matches!(o, Outbound::Answered { .. })));
        assert!(bot.session(USER).is_idle());
    }

    #[tokio::test]
    async fn test_store_failure_clears_session() {
        let bot = TestBot::new();
        bot.press(USER, "create").await;
        bot.text(USER, "Wash dishes").await;
        bot.text(USER, "All of them").await;
        bot.text(USER, "Pizza").await;
        bot.messenger.take();

        bot.store.set_failing(true);
        bot.press(USER, "assignee:Wife").await;

        assert!(bot.session(USER).is_idle());
        assert_eq!(
            bot.messenger.take_views(),
            vec![render::notice(Notice::CreateFailed)]
        );

        bot.store.set_failing(false);
        assert!(bot.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_on_list_shows_load_failed() {
        let bot = TestBot::new();
        bot.store.set_failing(true);
        bot.press(USER, "list:0").await;

        assert_eq!(
            bot.messenger.take_views(),
            vec![render::notice(Notice::LoadFailed)]
        );
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let bot = TestBot::new();
        let id = bot.seed("Vacuum", USER).await;

        bot.press(USER, &format!("delete:{id}")).await;
        let out = bot.messenger.take();
        assert_eq!(
            out[1..],
            [
                Outbound::Edited {
                    chat_id: CHAT,
                    message_id: PRESSED_MESSAGE,
                    view: render::notice(Notice::TaskDeleted),
                },
                Outbound::Sent {
                    chat_id: CHAT,
                    view: render::task_list(&[], 0),
                },
            ]
        );
        assert!(bot.store.snapshot().is_empty());

        bot.press(USER, &format!("delete:{id}")).await;
        assert_eq!(
            bot.messenger.take_views(),
            vec![render::notice(Notice::TaskNotFound)]
        );
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let bot = TestBot::new();
        bot.press(USER, "create").await;
        bot.text(USER, "Wash dishes").await;

        bot.press(USER + 1, "create").await;
        bot.text(USER + 1, "Mow lawn").await;
        bot.press(USER + 1, "cancel").await;

        assert_eq!(bot.session(USER).state, DialogueState::AwaitingDescription);
        assert!(bot.session(USER + 1).is_idle());
    }

    #[tokio::test]
    async fn test_bot_added_to_group_greets() {
        let bot = TestBot::new();
        let mut update = bot.text_update(USER, "");
        if let Some(message) = update.message.as_mut() {
            message.text = None;
            message.new_chat_members = Some(vec![User {
                id: 1,
                is_bot: true,
                username: Some(BOT_USERNAME.to_string()),
            }]);
        }

        bot.dispatcher.handle_update(&update).await;
        assert_eq!(bot.messenger.take_views(), vec![render::greeting()]);
    }

    #[tokio::test]
    async fn test_polling_advances_offset_and_stops_on_cancel() {
        let bot = TestBot::new();
        let cancel = CancellationToken::new();
        let first = bot.text_update(USER, "/start");
        let second = bot.text_update(USER, "/help");
        let last_id = second.update_id;

        let source = ScriptedSource::new(vec![Ok(vec![first, second])], cancel.clone());
        run_polling(&source, &bot.dispatcher, cancel).await;

        assert_eq!(source.offsets()[..2], [0, last_id + 1]);
        assert_eq!(
            bot.messenger.take_views(),
            vec![render::main_menu(), render::help()]
        );
    }

    #[tokio::test]
    async fn test_polling_fetch_error_then_cancel() {
        let bot = TestBot::new();
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(vec![Err("timed out".to_string())], cancel.clone());

        run_polling(&source, &bot.dispatcher, cancel).await;

        assert_eq!(source.offsets(), vec![0]);
        assert!(bot.messenger.take().is_empty());
    }
}
