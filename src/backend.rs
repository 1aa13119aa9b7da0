//! Generation Backend
//!
//! Unified interface over text-generation backends: an OpenAI-compatible HTTP
//! completion endpoint (llama.cpp server, Ollama) or a local command such as
//! `llama-cli`. Adapters never leak banner text: anything printed before the
//! response marker is stripped, and output without a marker passes through as-is.

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub mod command;
pub mod http;

pub use command::CommandBackend;
pub use http::HttpBackend;

/// Marker appended to prompts; the model response starts after it
pub const RESPONSE_MARKER: &str = "=== RESPONSE START ===";

/// Prefix of variant text recorded for a failed generation under the lenient policy
pub const LLM_ERROR_PREFIX: &str = "[LLM ERROR]";

/// Text generation backend
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Complete a rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;

    /// Short backend name used in variant source identifiers
    fn name(&self) -> &str;
}

/// Strip everything up to and including the response marker.
///
/// Falls back to the full (trimmed) output when no marker is present.
pub fn extract_response(output: &str) -> String {
    match output.split_once(RESPONSE_MARKER) {
        Some((_, response)) => response.trim().to_string(),
        None => output.trim().to_string(),
    }
}

/// Backend selection and settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// OpenAI-compatible `/chat/completions` endpoint
    Http {
        endpoint: String,
        model: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default)]
        temperature: Option<f32>,
    },
    /// Local program; `{prompt_file}` in args is replaced by a temp file path
    Command {
        program: PathBuf,
        #[serde(default = "default_command_args")]
        args: Vec<String>,
    },
}

fn default_command_args() -> Vec<String> {
    vec![
        "-f".to_string(),
        command::PROMPT_FILE_PLACEHOLDER.to_string(),
        "-n".to_string(),
        "300".to_string(),
    ]
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Http {
            endpoint: "http://localhost:8080/v1".to_string(),
            model: "mistral-7b-instruct".to_string(),
            api_key: None,
            max_tokens: Some(300),
            temperature: None,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BackendConfig::Http {
                endpoint, model, ..
            } => {
                if endpoint.trim().is_empty() {
                    return Err("HTTP backend endpoint cannot be empty".to_string());
                }
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err(format!(
                        "HTTP backend endpoint must start with http:// or https://, got '{}'",
                        endpoint
                    ));
                }
                if model.trim().is_empty() {
                    return Err("HTTP backend model cannot be empty".to_string());
                }
            }
            BackendConfig::Command { program, args } => {
                if program.as_os_str().is_empty() {
                    return Err("Command backend program cannot be empty".to_string());
                }
                if !args.iter().any(|a| a.contains(command::PROMPT_FILE_PLACEHOLDER)) {
                    return Err(format!(
                        "Command backend args must reference {}",
                        command::PROMPT_FILE_PLACEHOLDER
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Builds backend clients from configuration
pub struct BackendFactory;

impl BackendFactory {
    pub fn create(config: &BackendConfig) -> Result<Arc<dyn GenerationBackend>, ApiError> {
        config.validate().map_err(ApiError::BackendNotConfigured)?;
        let backend: Arc<dyn GenerationBackend> = match config {
            BackendConfig::Http {
                endpoint,
                model,
                api_key,
                max_tokens,
                temperature,
            } => Arc::new(HttpBackend::new(
                endpoint.clone(),
                model.clone(),
                api_key.clone(),
                *max_tokens,
                *temperature,
            )?),
            BackendConfig::Command { program, args } => {
                Arc::new(CommandBackend::new(program.clone(), args.clone()))
            }
        };
        Ok(backend)
    }
}

// Mock backend for testing
#[cfg(test)]
pub struct MockBackend {
    responses: Vec<Result<String, String>>,
    current: std::sync::Arc<std::sync::Mutex<usize>>,
    prompts: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(test)]
impl MockBackend {
    /// Scripted responses; `Err` entries fail that call
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses,
            current: std::sync::Arc::new(std::sync::Mutex::new(0)),
            prompts: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        *self.current.lock().unwrap()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut idx = self.current.lock().unwrap();
        let response = self
            .responses
            .get(*idx)
            .cloned()
            .unwrap_or_else(|| Ok("Mock response".to_string()));
        *idx += 1;
        response.map_err(ApiError::BackendError)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
