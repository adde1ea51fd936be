//! The single conversation shared by every client of the process.
//!
//! All access goes through one async mutex, held across the upstream call, so
//! generate/summarize/reset are applied one at a time and the turn sequence
//! stays in user/model pairs. Clients are not isolated from each other.

use crate::models::{ChatSession, Turn};
use crate::services::providers::{ProviderError, TextProvider};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct Conversation {
    session: Arc<Mutex<ChatSession>>,
    provider: Arc<dyn TextProvider>,
}

impl Conversation {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            session: Arc::new(Mutex::new(ChatSession::new())),
            provider,
        }
    }

    /// Discard the current session and start an empty one.
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        let discarded = std::mem::take(&mut *session);

        tracing::info!(
            discarded_turns = discarded.turn_count(),
            session_started_at = %discarded.created_at(),
            "Conversation reset"
        );
    }

    /// Send `message` as the next user turn and return the model's reply.
    ///
    /// On success the message and reply are appended to the session. On
    /// failure the session is left exactly as it was.
    pub async fn send_message(&self, message: &str) -> Result<String, ProviderError> {
        let mut session = self.session.lock().await;

        let response = self.provider.generate(session.history(), message).await?;

        session.record_exchange(message, response.text.clone());
        session.add_usage(response.input_tokens, response.output_tokens);

        tracing::info!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            turn_count = session.turn_count(),
            "Model replied"
        );

        Ok(response.text)
    }

    pub async fn turn_count(&self) -> usize {
        self.session.lock().await.turn_count()
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.session.lock().await.history().to_vec()
    }

    pub async fn snapshot(&self) -> ChatSession {
        self.session.lock().await.clone()
    }
}
