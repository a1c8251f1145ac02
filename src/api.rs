//! Webhook HTTP endpoint
//!
//! Telegram POSTs each update to `/{token}`; the handler dispatches it before
//! answering so updates from one chat are applied in delivery order.

mod handlers;

pub use handlers::create_router;

use crate::runtime::{AllowList, Dispatcher, Messenger, TaskStore};
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState<S, M, A>
where
    S: TaskStore,
    M: Messenger,
    A: AllowList,
{
    pub dispatcher: Arc<Dispatcher<S, M, A>>,
    /// Bot token; only POSTs to `/{token}` are dispatched
    pub webhook_token: Arc<str>,
}

impl<S, M, A> AppState<S, M, A>
where
    S: TaskStore,
    M: Messenger,
    A: AllowList,
{
    pub fn new(dispatcher: Arc<Dispatcher<S, M, A>>, webhook_token: &str) -> Self {
        Self {
            dispatcher,
            webhook_token: Arc::from(webhook_token),
        }
    }
}

// Manual impl: derive would require the type parameters to be Clone
impl<S, M, A> Clone for AppState<S, M, A>
where
    S: TaskStore,
    M: Messenger,
    A: AllowList,
{
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            webhook_token: Arc::clone(&self.webhook_token),
        }
    }
}
