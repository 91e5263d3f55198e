//! Ollama plan generator (feature `ollama`)
//!
//! Local inference through the Ollama chat API. No credential is involved,
//! so a session backed by it always starts; an unreachable daemon shows up
//! as a turn-level provider error.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
};
use async_trait::async_trait;
use ollama_rs::{
    generation::{
        chat::{ChatMessage, ChatMessageResponse, MessageRole, request::ChatMessageRequest},
    },
    models::ModelOptions as OllamaOptions,
    Ollama,
};

use crate::config::OllamaSettings;

pub struct OllamaProvider {
    client: Ollama,
    settings: OllamaSettings,
}

impl OllamaProvider {
    pub fn from_settings(settings: &OllamaSettings) -> Self {
        Self {
            client: Ollama::new(&settings.host, settings.port),
            settings: settings.clone(),
        }
    }

    /// Request model: the plan request's model unless it is empty
    fn model_for<'a>(&'a self, options: &'a GenerationOptions) -> &'a str {
        if options.model.is_empty() {
            &self.settings.model
        } else {
            &options.model
        }
    }

    fn chat_request(model: &str, messages: &[Message], options: &GenerationOptions) -> ChatMessageRequest {
        let history = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect();

        let sampling = OllamaOptions::default()
            .temperature(options.temperature)
            .top_p(options.top_p)
            .num_predict(i32::try_from(options.max_tokens).unwrap_or(i32::MAX));

        ChatMessageRequest::new(model.to_string(), history).options(sampling)
    }

    fn into_completion(response: ChatMessageResponse, model: &str) -> Completion {
        let usage = response.final_data.as_ref().map(|d| TokenUsage {
            input: u32::try_from(d.prompt_eval_count).unwrap_or(u32::MAX),
            output: u32::try_from(d.eval_count).unwrap_or(u32::MAX),
        });

        Completion {
            content: response.message.content,
            model: model.to_string(),
            usage,
            finish_reason: Some(FinishReason::Complete),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let model = self.model_for(options);
        tracing::debug!(host = %self.settings.host, model, "Ollama request");

        let response = self
            .client
            .send_chat_messages(Self::chat_request(model, messages, options))
            .await
            .map_err(|e| AgentError::Provider(format!("Ollama request failed: {e}")))?;

        Ok(Self::into_completion(response, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_credential_needed() {
        let provider = OllamaProvider::from_settings(&OllamaSettings::default());
        assert!(provider.check_credentials().is_ok());
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_empty_model_falls_back_to_settings() {
        let provider = OllamaProvider::from_settings(&OllamaSettings::default());
        let options = GenerationOptions {
            model: String::new(),
            ..GenerationOptions::default()
        };
        assert_eq!(provider.model_for(&options), "llama3.2");
    }
}
