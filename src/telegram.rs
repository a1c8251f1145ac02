//! Telegram Bot API client
//!
//! A thin JSON-over-HTTPS client for the handful of methods the bot uses.
//! Every call decodes the `{ok, result, description}` envelope; `ok: false`
//! becomes [`TelegramError::Api`].

mod types;

pub use types::*;

use crate::render::View;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Seconds the server holds a `getUpdates` call open
pub const LONG_POLL_TIMEOUT_SECS: u64 = 25;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Bot API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Bot API {method} failed: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self, TelegramError> {
        // Must outlast the long-poll hold time
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                REQUEST_TIMEOUT_SECS + LONG_POLL_TIMEOUT_SECS,
            ))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    async fn call<P, T>(&self, method: &'static str, params: &P) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response: ApiResponse<T> = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?
            .json()
            .await?;

        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api {
                method,
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }

    /// The bot's own username, used to recognize it joining a group
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &json!({})).await
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": LONG_POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "setWebhook",
                &json!({
                    "url": url,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }

    pub async fn send_message(&self, chat_id: i64, view: &View) -> Result<SentMessage, TelegramError> {
        self.call("sendMessage", &message_params(chat_id, None, view))
            .await
    }

    /// Replace the text and keyboard of an existing message
    pub async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        view: &View,
    ) -> Result<(), TelegramError> {
        // Result is the edited message, or `true` for inline messages
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &message_params(chat_id, Some(message_id), view),
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, query_id: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": query_id }))
            .await?;
        Ok(())
    }
}

fn message_params(chat_id: i64, message_id: Option<i64>, view: &View) -> serde_json::Value {
    let mut params = json!({
        "chat_id": chat_id,
        "text": view.text,
    });
    if let Some(message_id) = message_id {
        params["message_id"] = json!(message_id);
    }
    if let Some(keyboard) = &view.keyboard {
        params["reply_markup"] = json!(keyboard);
    }
    params
}
