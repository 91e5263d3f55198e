//! Plan Generator
//!
//! The LLM side of the loop: a backend that turns the planning prompt into
//! text. Sessions hold an `Arc<dyn LlmProvider>`, so tests can substitute a
//! generator that returns canned plans without touching the network.
//!
//! Nothing here assumes the text is JSON; the plan parser decides that.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Output budget for one multi-step plan
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;

/// Sampling settings for a plan request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Backend model name; empty means the backend's own default
    pub model: String,

    /// Kept low: plans should be reproducible, not creative
    pub temperature: f32,

    pub max_tokens: u32,

    pub top_p: f32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: 0.2,
            max_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            top_p: 0.9,
            stop_sequences: Vec::new(),
        }
    }
}

/// Raw generator output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text, possibly empty
    pub content: String,

    /// Model that answered, as reported by the backend when available
    pub model: String,

    pub usage: Option<TokenUsage>,

    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            finish_reason: Some(FinishReason::Complete),
        }
    }

    /// Generation stopped on the token budget, so the plan is likely cut off
    pub fn truncated(&self) -> bool {
        self.finish_reason == Some(FinishReason::TokenLimit)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
}

impl TokenUsage {
    pub const fn total(&self) -> u32 {
        self.input.saturating_add(self.output)
    }
}

/// Why generation stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Complete,
    TokenLimit,
    /// Suppressed by the backend's safety filters
    Blocked,
    Other,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short name for logs ("gemini", "ollama")
    fn name(&self) -> &str;

    /// Fail with `MissingCredential` when a required credential is absent.
    ///
    /// Checked once before a session starts. Backends without credentials
    /// keep the default.
    fn check_credentials(&self) -> Result<()> {
        Ok(())
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion>;
}
