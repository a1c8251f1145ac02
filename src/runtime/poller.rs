//! Long-polling update loop

use super::executor::Dispatcher;
use super::traits::{AllowList, Messenger, TaskStore, UpdateSource};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Fetch and dispatch updates one at a time until cancelled
pub async fn run_polling<U, S, M, A>(
    source: &U,
    dispatcher: &Dispatcher<S, M, A>,
    cancel: CancellationToken,
) where
    U: UpdateSource,
    S: TaskStore,
    M: Messenger,
    A: AllowList,
{
    tracing::info!("Polling for updates");
    let mut offset = 0;

    loop {
        let batch = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            batch = source.fetch(offset) => batch,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    dispatcher.handle_update(&update).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch updates, retrying");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("Polling stopped");
}
