//! HTTP request handlers

use super::AppState;
use crate::runtime::{AllowList, Messenger, TaskStore};
use crate::telegram::Update;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Create the webhook router
pub fn create_router<S, M, A>(state: AppState<S, M, A>) -> Router
where
    S: TaskStore + 'static,
    M: Messenger + 'static,
    A: AllowList + 'static,
{
    Router::new()
        // Bot tokens contain ':', so the token is matched in the handler
        .route("/:token", post(receive_update::<S, M, A>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn receive_update<S, M, A>(
    State(state): State<AppState<S, M, A>>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> StatusCode
where
    S: TaskStore,
    M: Messenger,
    A: AllowList,
{
    if token != *state.webhook_token {
        tracing::warn!(update_id = update.update_id, "Webhook call with wrong token");
        return StatusCode::NOT_FOUND;
    }

    // Always 200: a non-2xx makes Telegram redeliver the same update
    state.dispatcher.handle_update(&update).await;
    StatusCode::OK
}

async fn health() -> &'static str {
    concat!("household-task-bot ", env!("CARGO_PKG_VERSION"))
}
