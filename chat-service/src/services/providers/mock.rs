//! Mock provider implementation for testing.

use super::{FinishReason, ProviderError, ProviderResponse, TextProvider};
use crate::models::Turn;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A single call the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub history: Vec<Turn>,
    pub message: String,
}

/// Mock text provider for testing.
///
/// Replies with `"Mock response for: <message>"` unless a failure has been
/// set, and records every call it sees.
#[derive(Default)]
pub struct MockTextProvider {
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every call fails with `ApiError(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Mutex::new(Some(message.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn set_failure(&self, message: Option<String>) {
        *self.failure.lock().await = message;
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().await.last().cloned()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        history: &[Turn],
        message: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.lock().await.push(RecordedCall {
            history: history.to_vec(),
            message: message.to_string(),
        });

        if let Some(failure) = self.failure.lock().await.clone() {
            return Err(ProviderError::ApiError(failure));
        }

        Ok(ProviderResponse {
            text: format!("Mock response for: {}", message),
            input_tokens: i32::try_from(message.len() / 4).unwrap_or(i32::MAX),
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.failure.lock().await.as_ref() {
            Some(failure) => Err(ProviderError::ApiError(failure.clone())),
            None => Ok(()),
        }
    }
}
