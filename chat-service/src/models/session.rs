//! The running dialogue with the model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn. Serialized with the role names Gemini expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Ordered turn history plus the token usage it has accumulated.
///
/// Turns are only ever added in user/model pairs, so the history length is
/// always even.
#[derive(Debug, Clone)]
pub struct ChatSession {
    turns: Vec<Turn>,
    total_input_tokens: i64,
    total_output_tokens: i64,
    created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            created_at: Utc::now(),
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a completed exchange: the user's message and the model's reply.
    pub fn record_exchange(&mut self, message: impl Into<String>, reply: impl Into<String>) {
        self.turns.push(Turn::user(message));
        self.turns.push(Turn::model(reply));
    }

    pub fn add_usage(&mut self, input_tokens: i32, output_tokens: i32) {
        self.total_input_tokens += i64::from(input_tokens);
        self.total_output_tokens += i64::from(output_tokens);
    }

    pub fn total_input_tokens(&self) -> i64 {
        self.total_input_tokens
    }

    pub fn total_output_tokens(&self) -> i64 {
        self.total_output_tokens
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
