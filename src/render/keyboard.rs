//! Inline keyboard layout
//!
//! Serializes directly into the Bot API `InlineKeyboardMarkup` shape.

use crate::router::Callback;
use serde::Serialize;

/// One inline button carrying an encoded callback payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, callback: &Callback) -> Self {
        Self {
            text: text.into(),
            callback_data: callback.to_string(),
        }
    }
}

/// Rows of inline buttons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub inline_keyboard: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; empty rows are skipped
    #[must_use]
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.inline_keyboard.push(buttons);
        }
        self
    }

    /// Every callback payload in layout order
    #[cfg(test)]
    pub fn callbacks(&self) -> Vec<&str> {
        self.inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
            .collect()
    }
}
