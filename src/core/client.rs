//! Chat-completion client and translation calls

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{ChatMessage, TokenCounts, TranslationRequest, TranslationResult};
use crate::core::prompt::{split_detected_language, PromptSpec};

/// Model families that take `max_completion_tokens` instead of `max_tokens`
const COMPLETION_LIMIT_FAMILIES: &[&str] = &["gpt-5", "o1", "o3", "o4"];

/// Whether a model expects the `max_completion_tokens` field
pub fn uses_completion_token_limit(model: &str) -> bool {
    COMPLETION_LIMIT_FAMILIES
        .iter()
        .any(|family| model.starts_with(family))
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    id: Option<String>,
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
}

/// One successful completion
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub tokens: TokenCounts,
    pub model: String,
    pub request_id: Option<String>,
}

/// Map a non-success response onto an error kind using the status and the
/// provider's structured error fields
fn classify_error(status: u16, body: &str) -> TranslationError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);

    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP Error: {}", status));
    let code = parsed.as_ref().and_then(|e| e.code.as_deref()).unwrap_or("");
    let kind = parsed.as_ref().and_then(|e| e.kind.as_deref()).unwrap_or("");

    if status == 401 || code == "invalid_api_key" {
        return TranslationError::Authentication { message };
    }

    if code == "insufficient_quota" || kind == "insufficient_quota" {
        return TranslationError::QuotaExceeded { message };
    }

    if status == 429 {
        return TranslationError::RateLimited { message };
    }

    TranslationError::ApiError { status, message }
}

/// Client for the chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    config: Arc<TranslatorConfig>,
}

impl ChatClient {
    /// Create a new client
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Default model from configuration
    pub fn default_model(&self) -> &str {
        &self.config.model
    }

    /// Send messages and return the first choice
    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<Completion> {
        let limit = self.config.max_output_tokens;
        let (max_tokens, max_completion_tokens) = if uses_completion_token_limit(model) {
            (None, Some(limit))
        } else {
            (Some(limit), None)
        };

        let body = CompletionRequest {
            model,
            messages,
            temperature,
            max_tokens,
            max_completion_tokens,
        };

        debug!(
            "POST {} model={} messages={} temperature={}",
            self.config.api_endpoint,
            model,
            messages.len(),
            temperature
        );

        let response = self
            .client
            .post(&self.config.api_endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslationError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error = classify_error(status.as_u16(), &error_text);
            warn!("Chat completion failed: {}", error);
            return Err(error);
        }

        let text = response
            .text()
            .await
            .map_err(|e| TranslationError::NetworkError {
                message: e.to_string(),
            })?;
        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| TranslationError::InvalidResponseError {
                message: e.to_string(),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No completion in response".to_string(),
            })?;

        let tokens = parsed
            .usage
            .map(|u| TokenCounts {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(Completion {
            content: content.trim().to_string(),
            tokens,
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            request_id: parsed.id,
        })
    }

    /// Translate a single request
    pub async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResult> {
        request.validate_languages()?;

        let prompt = PromptSpec::for_request(request)?;
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());

        let messages = [
            ChatMessage::system(prompt.system_prompt),
            ChatMessage::user(request.text.clone()),
        ];

        let completion = self.complete(&model, &messages, prompt.temperature).await?;

        let (translation, detected_source_lang) = if request.is_auto_detect() {
            split_detected_language(&completion.content)
        } else {
            (completion.content, None)
        };

        if let Some(lang) = &detected_source_lang {
            debug!("Detected source language: {}", lang);
        }

        Ok(TranslationResult {
            translation,
            detected_source_lang,
            tokens: completion.tokens,
            // Pricing is keyed on the requested id, not the dated snapshot the API echoes
            model_used: model,
            request_id: completion.request_id,
        })
    }
}
