use crate::models::process::summary_prompt;
use crate::models::{ProcessRequest, ProcessResponse};
use crate::startup::AppState;
use crate::models::RequestError;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use service_core::error::AppError;

/// `POST /process`: reset the conversation, or send generate/summarize text
/// to the model through it.
#[tracing::instrument(skip_all, fields(action = tracing::field::Empty))]
pub async fn process(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ProcessResponse>, AppError> {
    // An unreadable body gets the same JSON error as an unparsable one.
    let body = body.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Failed to read request body");
        RequestError::InvalidJson
    })?;
    let request = ProcessRequest::from_slice(&body)?;
    tracing::Span::current().record("action", request.action());

    let response = match request {
        ProcessRequest::Reset => {
            state.conversation.reset().await;
            ProcessResponse::reset()
        }
        ProcessRequest::Generate { keywords } => {
            let text = state.conversation.send_message(&keywords).await?;
            ProcessResponse::generated(text)
        }
        ProcessRequest::Summarize { article } => {
            let summary = state
                .conversation
                .send_message(&summary_prompt(&article))
                .await?;
            ProcessResponse::summary(summary)
        }
    };

    Ok(Json(response))
}
