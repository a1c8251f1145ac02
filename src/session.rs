//! User session store
//!
//! One dialogue session per user, process-wide. Idle sessions are not kept:
//! reading an unknown user yields a fresh idle session, and storing an idle
//! session removes the entry. Sessions never expire on their own.

use crate::db::UserId;
use crate::state_machine::{transition, DialogueContext, Effect, Event, Session, TransitionError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the user's session
    pub fn get(&self, user_id: UserId) -> Session {
        self.lock().get(&user_id).cloned().unwrap_or_default()
    }

    pub fn is_idle(&self, user_id: UserId) -> bool {
        self.lock().get(&user_id).map_or(true, Session::is_idle)
    }

    /// Apply one dialogue event to the user's session under a single lock,
    /// so concurrent updates from the same user cannot interleave
    pub fn advance(&self, user_id: UserId, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let mut sessions = self.lock();
        let current = sessions.get(&user_id).cloned().unwrap_or_default();
        let result = transition(&current, &DialogueContext::new(user_id), event)?;

        if result.new_session.is_idle() {
            sessions.remove(&user_id);
        } else {
            sessions.insert(user_id, result.new_session);
        }
        Ok(result.effects)
    }

    pub fn clear(&self, user_id: UserId) {
        self.lock().remove(&user_id);
    }

    /// Users with a dialogue in progress
    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}
