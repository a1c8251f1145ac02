//! Process configuration from environment variables

use crate::db::UserId;
use crate::router::Callback;
use crate::telegram::DEFAULT_API_BASE_URL;
use std::collections::HashSet;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_PATH: &str = "./data/tasks.db";
const DEFAULT_HOUSEHOLD: &str = "Husband,Wife";

/// Bot API limit on `callback_data`
const MAX_CALLBACK_BYTES: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// How updates reach the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Long-poll `getUpdates`
    Polling,
    /// Register `{url}/{token}` and serve it on `port`
    Webhook { url: String, port: u16 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub delivery: Delivery,
    pub db_path: String,
    pub allowed_user_ids: HashSet<UserId>,
    /// Names offered at the assignee step
    pub household: Vec<String>,
    pub api_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = var("TOKEN").ok_or(ConfigError::Missing("TOKEN"))?;

        let debug = match var("DEBUG") {
            None => false,
            Some(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
                name: "DEBUG",
                value,
            })?,
        };

        let delivery = if debug {
            Delivery::Polling
        } else {
            let url = var("URL").ok_or(ConfigError::Missing("URL"))?;
            let port = match var("PORT") {
                None => DEFAULT_PORT,
                Some(value) => value
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            };
            Delivery::Webhook {
                url: url.trim_end_matches('/').to_string(),
                port,
            }
        };

        let allowed_user_ids = match var("ALLOWED_USER_IDS") {
            None => HashSet::new(),
            Some(value) => parse_user_ids(&value).ok_or(ConfigError::Invalid {
                name: "ALLOWED_USER_IDS",
                value,
            })?,
        };

        let household_raw = var("HOUSEHOLD").unwrap_or_else(|| DEFAULT_HOUSEHOLD.to_string());
        let household = parse_household(&household_raw).ok_or(ConfigError::Invalid {
            name: "HOUSEHOLD",
            value: household_raw,
        })?;

        Ok(Self {
            token,
            delivery,
            db_path: var("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            allowed_user_ids,
            household,
            api_base_url: var("TELEGRAM_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }

    /// Webhook route path; the token keeps the endpoint unguessable
    pub fn webhook_path(&self) -> String {
        format!("/{}", self.token)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Comma-separated ids; any unparsable entry rejects the whole list
fn parse_user_ids(value: &str) -> Option<HashSet<UserId>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| id.parse().ok())
        .collect()
}

/// Comma-separated names that fit in an `assignee:{name}` callback
fn parse_household(value: &str) -> Option<Vec<String>> {
    let names: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let fits = |name: &String| {
        !name.contains(':')
            && Callback::Assignee { name: name.clone() }.to_string().len() <= MAX_CALLBACK_BYTES
    };
    (!names.is_empty() && names.iter().all(fits)).then_some(names)
}
