#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chat_service::config::{ChatConfig, GoogleConfig, ModelConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use chat_service::services::providers::mock::MockTextProvider;
use chat_service::startup::{build_router, AppState};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mock: Arc<MockTextProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mock(MockTextProvider::new())
    }

    pub fn with_mock(mock: MockTextProvider) -> Self {
        let mock = Arc::new(mock);
        let state = AppState::new(mock.clone());
        let router = build_router(state.clone());
        Self {
            router,
            state,
            mock,
        }
    }

    /// POST a raw body to `/process` with a JSON content type.
    pub async fn post_raw(&self, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, body: Value) -> (StatusCode, Value) {
        self.post_raw(body.to_string()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

pub fn test_config(port: u16) -> ChatConfig {
    ChatConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port,
            log_level: "info".to_string(),
        },
        google: GoogleConfig {
            api_key: Secret::new("test-api-key".to_string()),
            api_base: DEFAULT_API_BASE.to_string(),
        },
        models: ModelConfig {
            text_model: DEFAULT_MODEL.to_string(),
        },
        otlp_endpoint: None,
    }
}
