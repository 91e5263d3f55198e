//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` over the Google Generative Language REST
//! API (`models/{model}:generateContent`).
//!
//! - `x-goog-api-key` header authentication
//! - System messages go to the top-level `systemInstruction`
//! - Assistant turns use the `model` role

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key; empty means not configured
    pub api_key: String,

    /// Default model when the request does not name one
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 60,
        }
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = if model.is_empty() { &self.config.model } else { model };
        format!("{}/v1beta/models/{}:generateContent", self.config.base_url, model)
    }

    /// Convert agent messages to a Gemini request body
    fn build_request(messages: &[Message], options: &GenerationOptions) -> GenerateRequest {
        let system: Vec<Part> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| Part { text: Some(m.content.clone()) })
            .collect();

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(match m.role {
                    Role::Assistant => "model".into(),
                    _ => "user".into(),
                }),
                parts: vec![Part { text: Some(m.content.clone()) }],
            })
            .collect();

        GenerateRequest {
            contents,
            system_instruction: (!system.is_empty()).then_some(Content { role: None, parts: system }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
                stop_sequences: options.stop_sequences.clone(),
            },
        }
    }

    /// Convert a Gemini response to an agent completion.
    ///
    /// A response without candidates yields empty content rather than an
    /// error; the plan parser rejects it downstream.
    fn convert_completion(response: GenerateResponse, model: &str) -> Completion {
        let candidate = response.candidates.into_iter().next();

        let content = candidate
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let finish_reason = candidate
            .and_then(|c| c.finish_reason)
            .map(|r| match r.as_str() {
                "STOP" => FinishReason::Complete,
                "MAX_TOKENS" => FinishReason::TokenLimit,
                "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => FinishReason::Blocked,
                _ => FinishReason::Other,
            });

        Completion {
            content,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            usage: response.usage_metadata.map(|u| TokenUsage {
                input: u.prompt_token_count,
                output: u.candidates_token_count,
            }),
            finish_reason,
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn check_credentials(&self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(AgentError::MissingCredential(API_KEY_VAR.into()));
        }
        Ok(())
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.check_credentials()?;

        let body = Self::build_request(messages, options);
        let url = self.endpoint(&options.model);
        tracing::debug!(%url, max_tokens = options.max_tokens, "Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Gemini returned an error");
            return Err(AgentError::Provider(format!("Gemini HTTP {status}: {text}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Invalid Gemini response: {e}")))?;

        Ok(Self::convert_completion(parsed, &options.model))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let messages = vec![Message::system("Plan only."), Message::user("User query: weather?")];
        let options = GenerationOptions::default();

        let body = serde_json::to_value(GeminiProvider::build_request(&messages, &options)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Plan only.");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 500);
        assert!(body["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_request_without_system_message() {
        let body = serde_json::to_value(GeminiProvider::build_request(
            &[Message::user("hi"), Message::assistant("hello")],
            &GenerationOptions::default(),
        ))
        .unwrap();

        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["contents"][1]["role"], "model");
    }

    #[test]
    fn test_convert_completion_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "```json\n{\"plan\": "}, {"text": "[]}\n```"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 12, "totalTokenCount": 132}
        }))
        .unwrap();

        let completion = GeminiProvider::convert_completion(response, "gemini-1.5-flash");

        assert_eq!(completion.content, "```json\n{\"plan\": []}\n```");
        assert_eq!(completion.finish_reason, Some(FinishReason::Complete));
        assert_eq!(completion.usage.unwrap().total(), 132);
        assert_eq!(completion.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_convert_completion_tolerates_empty_response() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        let completion = GeminiProvider::convert_completion(response, "gemini-1.5-flash");

        assert_eq!(completion.content, "");
        assert!(completion.finish_reason.is_none());
    }

    #[test]
    fn test_max_tokens_marks_truncation() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"plan\": ["}]}, "finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();

        assert!(GeminiProvider::convert_completion(response, "m").truncated());
    }

    #[test]
    fn test_endpoint_uses_request_model() {
        let provider = GeminiProvider::from_config(GeminiConfig::default()).unwrap();
        assert_eq!(
            provider.endpoint("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert!(provider.endpoint("").contains("gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_complete_without_key_makes_no_request() {
        let provider = GeminiProvider::from_config(GeminiConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..GeminiConfig::default()
        })
        .unwrap();

        let err = provider
            .complete(&[Message::user("hi")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MissingCredential(_)));
    }
}
