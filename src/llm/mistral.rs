// Mistral AI chat-completions client
// API Reference: https://docs.mistral.ai/api/#tag/chat
//
// Model selection is length-based: small pages go to the cheaper small
// model, bigger pages to the large one, and anything beyond the large
// model's comfortable input size is skipped entirely rather than truncated.

use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";

pub struct MistralClient {
    client: Client,
    api_key: String,
    api_base: String,
}

// Request types for the Mistral API
#[derive(Serialize)]
struct MistralChatRequest {
    model: String,
    messages: Vec<MistralMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize)]
struct MistralMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

// Response types for the Mistral API
#[derive(Deserialize)]
struct MistralChatResponse {
    choices: Vec<MistralChoice>,
    usage: MistralUsage,
}

#[derive(Deserialize)]
struct MistralChoice {
    message: MistralResponseMessage,
    finish_reason: String,
}

#[derive(Deserialize)]
struct MistralResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct MistralUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct MistralErrorResponse {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

impl MistralClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            api_base: MISTRAL_API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint. Used by tests to talk to a
    /// local mock server.
    pub fn with_api_base(api_key: &str, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = format!("{}/chat/completions", self.api_base);

        let messages: Vec<MistralMessage> = request
            .messages
            .iter()
            .map(|m| MistralMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect();

        let mistral_request = MistralChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_object.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
            stream: Some(false),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&mistral_request)
            .send()
            .await
            .map_err(|e| AppError::LLMApi(format!("Mistral request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<MistralErrorResponse>(&error_text) {
                return Err(AppError::LLMApi(format!(
                    "Mistral API error ({}): {} (type: {:?})",
                    status, error_response.message, error_response.error_type
                )));
            }

            return Err(AppError::LLMApi(format!(
                "Mistral API error ({}): {}",
                status, error_text
            )));
        }

        let mistral_response: MistralChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse Mistral response: {}", e)))?;

        let choice = mistral_response
            .choices
            .first()
            .ok_or_else(|| AppError::LLMApi("Mistral returned no choices".to_string()))?;

        Ok(LLMResponse {
            content: choice.message.content.clone(),
            finish_reason: choice.finish_reason.clone(),
            usage: TokenUsage {
                prompt_tokens: mistral_response.usage.prompt_tokens,
                completion_tokens: mistral_response.usage.completion_tokens,
                total_tokens: mistral_response.usage.total_tokens,
            },
        })
    }
}

/// Pick the model for a cleaned page by its character count, or `None` when
/// the page is too large to summarize at all.
pub fn choose_model(content_length: usize) -> Option<&'static str> {
    if content_length <= models::SMALL_MAX_CHARS {
        Some(models::MISTRAL_SMALL)
    } else if content_length <= models::LARGE_MAX_CHARS {
        Some(models::MISTRAL_LARGE)
    } else {
        None
    }
}

/// Available Mistral models and the sizing thresholds for picking one.
pub mod models {
    /// Cheaper default for everyday pages
    pub const MISTRAL_SMALL: &str = "mistral-small-latest";
    /// Bigger model for long pages
    pub const MISTRAL_LARGE: &str = "mistral-large-latest";

    /// Largest cleaned page (in chars) still sent to the small model
    pub const SMALL_MAX_CHARS: usize = 110_000;
    /// Largest cleaned page (in chars) sent to any model; beyond this the
    /// page is skipped
    pub const LARGE_MAX_CHARS: usize = 300_000;
}
