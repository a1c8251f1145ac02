//! Household task bot
//!
//! A Telegram bot for a household to create, list, edit and delete shared
//! chores through inline-keyboard menus and short question dialogues.

mod api;
mod config;
mod db;
mod lang;
mod render;
mod router;
mod runtime;
mod session;
mod state_machine;
mod telegram;

use api::{create_router, AppState};
use config::{Config, Delivery};
use db::Database;
use runtime::{DatabaseStore, Dispatcher, ProductionDispatcher, StaticAllowList};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use telegram::TelegramClient;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "household_task_bot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path, "Opening database");
    let db = Database::open(&config.db_path)?;

    if config.allowed_user_ids.is_empty() {
        tracing::warn!("ALLOWED_USER_IDS is empty; every update will be dropped");
    }

    let client = TelegramClient::new(&config.token, &config.api_base_url)?;
    let me = client.get_me().await?;
    tracing::info!(username = ?me.username, "Connected to Telegram");

    let dispatcher: ProductionDispatcher = Dispatcher::new(
        DatabaseStore::new(db),
        client.clone(),
        StaticAllowList::new(config.allowed_user_ids.clone()),
        config.household.clone(),
    )
    .with_bot_username(me.username);

    match &config.delivery {
        Delivery::Polling => {
            client.delete_webhook().await?;

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    shutdown_signal().await;
                    cancel.cancel();
                }
            });

            runtime::run_polling(&client, &dispatcher, cancel).await;
        }
        Delivery::Webhook { url, port } => {
            let path = config.webhook_path();
            client.set_webhook(&format!("{url}{path}")).await?;

            let app = create_router(AppState::new(Arc::new(dispatcher), &config.token));
            let addr = SocketAddr::from(([0, 0, 0, 0], *port));
            tracing::info!(%addr, "Webhook server listening");

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    tracing::info!("Shut down");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
