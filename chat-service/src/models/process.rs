//! Request and response envelopes for `POST /process`.
//!
//! The body is parsed once into a [`ProcessRequest`]; every validation failure
//! is a [`RequestError`] whose `Display` text is the message returned to the
//! caller.

use serde::Serialize;
use serde_json::{Map, Value};
use service_core::error::AppError;
use thiserror::Error;

pub const RESET_MESSAGE: &str = "Chat history reset successfully";

const SUMMARY_INSTRUCTION: &str = "Summarize the following article:\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Request body must be in JSON format.")]
    InvalidJson,

    #[error("Invalid action. Use \"generate\", \"summarize\", or \"reset\".")]
    InvalidAction,

    #[error("Keywords (prompt) are required for text generation.")]
    MissingKeywords,

    #[error("Article text is required for summarization.")]
    MissingArticle,
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// A validated request. Payload strings are already trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessRequest {
    Reset,
    Generate { keywords: String },
    Summarize { article: String },
}

impl ProcessRequest {
    /// Parse a raw request body. The content type is not consulted.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| RequestError::InvalidJson)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        // Empty or non-object JSON carries no action and is treated like a
        // missing body.
        let fields = match value {
            Value::Object(fields) if !fields.is_empty() => fields,
            _ => return Err(RequestError::InvalidJson),
        };

        let action = fields
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default();

        match action.as_str() {
            "reset" => Ok(ProcessRequest::Reset),
            "generate" => required_text(&fields, "keywords")
                .map(|keywords| ProcessRequest::Generate { keywords })
                .ok_or(RequestError::MissingKeywords),
            "summarize" => required_text(&fields, "article")
                .map(|article| ProcessRequest::Summarize { article })
                .ok_or(RequestError::MissingArticle),
            _ => Err(RequestError::InvalidAction),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ProcessRequest::Reset => "reset",
            ProcessRequest::Generate { .. } => "generate",
            ProcessRequest::Summarize { .. } => "summarize",
        }
    }
}

/// Trimmed string field, or `None` when absent, not a string, or blank.
fn required_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Instruction sent upstream for a summarize request.
pub fn summary_prompt(article: &str) -> String {
    format!("{}{}", SUMMARY_INSTRUCTION, article)
}

/// Number of whitespace-delimited words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProcessResponse {
    Reset {
        message: String,
    },
    Generate {
        length: usize,
        generated_text: String,
    },
    Summarize {
        summary: String,
    },
}

impl ProcessResponse {
    pub fn reset() -> Self {
        ProcessResponse::Reset {
            message: RESET_MESSAGE.to_string(),
        }
    }

    pub fn generated(text: String) -> Self {
        ProcessResponse::Generate {
            length: word_count(&text),
            generated_text: text,
        }
    }

    pub fn summary(summary: String) -> Self {
        ProcessResponse::Summarize { summary }
    }
}
