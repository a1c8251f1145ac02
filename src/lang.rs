//! User-facing strings

pub const MAIN_MENU: &str = "🏠 Main menu:";
pub const HELP: &str = "I keep track of household tasks.\n\n\
    /menu - main menu\n\
    /tasks - list of tasks\n\
    /help - this message\n\n\
    Create a task from the menu, then answer four questions: \
    title, description, reward and assignee.";
pub const BOT_ADDED_TO_GROUP: &str =
    "Hi! I'm here to track household tasks. Send /menu to get started.";

pub const TASK_LIST_HEADER: &str = "📝 Tasks:";
pub const NO_TASKS: &str = "No tasks yet";
pub const TASK_NOT_FOUND: &str = "Task not found";

pub const PROMPT_TITLE: &str = "Enter the task title:";
pub const PROMPT_DESCRIPTION: &str = "Enter the task description:";
pub const PROMPT_REWARD: &str = "Enter the reward for completing it:";
pub const PROMPT_ASSIGNEE: &str = "Who is the task for? (pick or type a name):";
pub const PROMPT_NEW_TITLE: &str = "Enter the new task title:";
pub const PROMPT_NEW_DESCRIPTION: &str = "Enter the new task description:";
pub const PROMPT_NEW_REWARD: &str = "Enter the new reward:";
pub const PROMPT_NEW_ASSIGNEE: &str = "Enter the new assignee:";

pub const TASK_UPDATED: &str = "Task updated!";
pub const TASK_DELETED: &str = "Task deleted!";
pub const CREATE_FAILED: &str = "Failed to create the task";
pub const UPDATE_FAILED: &str = "Failed to update the task";
pub const DELETE_FAILED: &str = "Failed to delete the task";
pub const LOAD_FAILED: &str = "Failed to load tasks";
pub const BLANK_ANSWER: &str = "This answer can't be empty";

pub const BUTTON_TASK_LIST: &str = "📝 Task list";
pub const BUTTON_CREATE: &str = "➕ Create task";
pub const BUTTON_PREVIOUS: &str = "⬅️ Back";
pub const BUTTON_NEXT: &str = "Next ➡️";
pub const BUTTON_TO_MENU: &str = "🔙 To menu";
pub const BUTTON_TO_LIST: &str = "🔙 To list";
pub const BUTTON_EDIT: &str = "✏️ Edit";
pub const BUTTON_DELETE: &str = "🗑 Delete";
pub const BUTTON_CANCEL: &str = "❌ Cancel";

pub fn task_created(id: i64) -> String {
    format!("Task created! ID: {id}")
}
