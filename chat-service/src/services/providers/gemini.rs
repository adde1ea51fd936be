//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` REST method with the full turn history on
//! every request; the API itself is stateless.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use crate::config::DEFAULT_API_BASE;
use crate::models::Turn;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub params: GenerationParams,
}

impl GeminiConfig {
    pub fn new(api_key: Secret<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            params: GenerationParams::default(),
        }
    }
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn build_request(&self, history: &[Turn], message: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content::text(turn.role.as_str(), &turn.text))
            .collect();
        contents.push(Content::text("user", message));

        let params = &self.config.params;
        GenerateContentRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                max_output_tokens: params.max_output_tokens,
                response_mime_type: params.response_mime_type.clone(),
            },
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        history: &[Turn],
        message: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = self.build_request(history, message);

        tracing::debug!(
            model = %self.config.model,
            prompt_len = message.len(),
            history_turns = history.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let detail = api_error_message(&error_text).unwrap_or(error_text);

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited(detail));
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, detail
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        parse_response(api_response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!(
            "{}/models/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

fn parse_response(
    api_response: GenerateContentResponse,
) -> Result<ProviderResponse, ProviderError> {
    let Some(candidate) = api_response.candidates.first() else {
        if let Some(reason) = api_response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(ProviderError::ContentFiltered(format!(
                "prompt blocked ({})",
                reason
            )));
        }
        return Err(ProviderError::EmptyResponse);
    };

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") => FinishReason::ContentFilter,
        _ => FinishReason::Complete,
    };

    if finish_reason == FinishReason::ContentFilter {
        return Err(ProviderError::ContentFiltered(
            "response blocked (SAFETY)".to_string(),
        ));
    }

    let text: String = candidate
        .content
        .iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let usage = api_response.usage_metadata.unwrap_or_default();

    Ok(ProviderResponse {
        text,
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
        finish_reason,
    })
}

/// Pull `error.message` out of a Gemini error body, if it has one.
fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|body| body.error.message)
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: i32,
    max_output_tokens: i32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> GeminiTextProvider {
        GeminiTextProvider::new(GeminiConfig::new(
            Secret::new("test-key".to_string()),
            "gemini-2.0-flash-exp",
        ))
        .unwrap()
    }

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = GeminiTextProvider::new(GeminiConfig::new(
            Secret::new(String::new()),
            "gemini-2.0-flash-exp",
        ));
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn request_carries_history_then_new_message() {
        let history = vec![Turn::user("hi"), Turn::model("hello")];
        let request = provider().build_request(&history, "and now?");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "hi" }] },
                    { "role": "model", "parts": [{ "text": "hello" }] },
                    { "role": "user", "parts": [{ "text": "and now?" }] }
                ],
                "generationConfig": {
                    "temperature": 1.0,
                    "topP": 0.95,
                    "topK": 40,
                    "maxOutputTokens": 8192,
                    "responseMimeType": "text/plain"
                }
            })
        );
    }

    #[test]
    fn api_url_targets_generate_content() {
        assert_eq!(
            provider().api_url("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn text_parts_are_concatenated() {
        let parsed = parse_response(response(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Rivers " }, { "text": "run." }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3 }
        })))
        .unwrap();

        assert_eq!(parsed.text, "Rivers run.");
        assert_eq!(parsed.input_tokens, 12);
        assert_eq!(parsed.output_tokens, 3);
        assert_eq!(parsed.finish_reason, FinishReason::Complete);
    }

    #[test]
    fn max_tokens_still_returns_text() {
        let parsed = parse_response(response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "cut" }] },
                "finishReason": "MAX_TOKENS"
            }]
        })))
        .unwrap();
        assert_eq!(parsed.finish_reason, FinishReason::Length);
        assert_eq!(parsed.input_tokens, 0);
    }

    #[test]
    fn safety_finish_is_content_filtered() {
        let result = parse_response(response(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })));
        assert!(matches!(result, Err(ProviderError::ContentFiltered(_))));
    }

    #[test]
    fn blocked_prompt_is_content_filtered() {
        let result = parse_response(response(json!({
            "promptFeedback": { "blockReason": "OTHER" }
        })));
        match result {
            Err(ProviderError::ContentFiltered(msg)) => assert!(msg.contains("OTHER")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.text)),
        }
    }

    #[test]
    fn no_candidates_is_empty_response() {
        let result = parse_response(response(json!({ "candidates": [] })));
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }

    #[test]
    fn error_body_message_is_extracted() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body).as_deref(), Some("API key not valid."));
        assert_eq!(api_error_message("not json"), None);
    }
}
