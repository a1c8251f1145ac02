//! Runtime for executing dialogue effects
//!
//! The dispatcher owns the session store and drives the pure state machine;
//! all I/O goes through the traits in [`traits`].

mod executor;
mod poller;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::Dispatcher;
pub use poller::run_polling;
pub use traits::*;

use crate::telegram::TelegramClient;

/// Type alias for the production dispatcher with concrete implementations
pub type ProductionDispatcher = Dispatcher<DatabaseStore, TelegramClient, StaticAllowList>;
