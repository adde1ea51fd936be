use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Model used when `GENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Public Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    /// OTLP collector endpoint; trace export is disabled when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Secret<String>,
    /// Base URL of the Gemini REST API (overridable for local testing).
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub text_model: String,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let api_key = get_env("GENAI_API_KEY", None)?;
        if api_key.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_API_KEY is set but empty"
            )));
        }

        Ok(ChatConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: Secret::new(api_key),
                api_base: get_env("GENAI_API_BASE", Some(DEFAULT_API_BASE))?,
            },
            models: ModelConfig {
                text_model: get_env("GENAI_MODEL", Some(DEFAULT_MODEL))?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn get_env(key: &str, default: Option<&str>) -> Result<String, AppError> {
    match (env::var(key), default) {
        (Ok(val), _) => Ok(val),
        (Err(_), Some(def)) => Ok(def.to_string()),
        (Err(_), None) => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required but not set",
            key
        ))),
    }
}
