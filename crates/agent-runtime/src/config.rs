//! Runtime Configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded by
//! the binary before this runs). Unset variables fall back to defaults; an
//! unset or empty `GEMINI_API_KEY` is kept empty and reported when the
//! session starts.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{error::AgentError, AgentConfig, LlmProvider, Result};

use crate::gemini::{GeminiConfig, GeminiProvider};

pub const DEFAULT_TOOL_SERVER: &str = "travel-worker";
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;

/// Which backend generates plans
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(AgentError::Config(format!(
                "Unknown plan provider '{other}' (expected 'gemini' or 'ollama')"
            ))),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// Worker process settings
#[derive(Clone, Debug)]
pub struct ToolServerConfig {
    /// Command line used to spawn the worker
    pub command: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_TOOL_SERVER.into(),
            timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

impl ToolServerConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Ollama settings, used when the `ollama` feature is enabled
#[derive(Clone, Debug)]
pub struct OllamaSettings {
    pub host: String,
    pub port: u16,
    pub model: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub provider: ProviderKind,
    pub gemini: GeminiConfig,
    pub ollama: OllamaSettings,
    pub tool_server: ToolServerConfig,
    pub max_output_tokens: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            gemini: GeminiConfig::default(),
            ollama: OllamaSettings::default(),
            tool_server: ToolServerConfig::default(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(provider) = var("PLANNER_PROVIDER") {
            config.provider = provider.parse()?;
        }

        config.gemini.api_key = lookup("GEMINI_API_KEY").unwrap_or_default().trim().to_string();
        if let Some(model) = var("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(url) = var("GEMINI_BASE_URL") {
            config.gemini.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(host) = var("OLLAMA_HOST") {
            config.ollama.host = host;
        }
        if let Some(port) = var("OLLAMA_PORT") {
            config.ollama.port = parse_number("OLLAMA_PORT", &port)?;
        }
        if let Some(model) = var("OLLAMA_MODEL") {
            config.ollama.model = model;
        }

        if let Some(command) = var("TOOL_SERVER_COMMAND") {
            config.tool_server.command = command;
        }
        if let Some(secs) = var("TOOL_CALL_TIMEOUT_SECS") {
            config.tool_server.timeout_secs = parse_number("TOOL_CALL_TIMEOUT_SECS", &secs)?;
        }
        if let Some(max) = var("PLAN_MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = parse_number("PLAN_MAX_OUTPUT_TOKENS", &max)?;
        }

        Ok(config)
    }

    /// Model name of the selected provider
    pub fn model(&self) -> &str {
        match self.provider {
            ProviderKind::Gemini => &self.gemini.model,
            ProviderKind::Ollama => &self.ollama.model,
        }
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        match self.provider {
            ProviderKind::Gemini => self.gemini.model = model.into(),
            ProviderKind::Ollama => self.ollama.model = model.into(),
        }
    }

    /// Session configuration for the agent loop
    pub fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig::default();
        config.generation.model = self.model().to_string();
        config.generation.max_tokens = self.max_output_tokens;
        config
    }

    /// Instantiate the selected plan generator
    pub fn generator(&self) -> Result<Arc<dyn LlmProvider>> {
        match self.provider {
            ProviderKind::Gemini => Ok(Arc::new(GeminiProvider::from_config(self.gemini.clone())?)),
            #[cfg(feature = "ollama")]
            ProviderKind::Ollama => Ok(Arc::new(crate::ollama::OllamaProvider::from_settings(&self.ollama))),
            #[cfg(not(feature = "ollama"))]
            ProviderKind::Ollama => Err(AgentError::Config(
                "Ollama support is not compiled in (enable the 'ollama' feature)".into(),
            )),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AgentError::Config(format!("{key} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model(), "gemini-1.5-flash");
        assert_eq!(config.tool_server.command, "travel-worker");
        assert_eq!(config.tool_server.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_output_tokens, 500);
        assert!(config.gemini.api_key.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("PLANNER_PROVIDER", "Ollama"),
            ("OLLAMA_MODEL", "qwen2.5"),
            ("OLLAMA_PORT", "11500"),
            ("TOOL_SERVER_COMMAND", "python travel_server.py"),
            ("TOOL_CALL_TIMEOUT_SECS", "5"),
            ("PLAN_MAX_OUTPUT_TOKENS", "300"),
        ]))
        .unwrap();

        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.model(), "qwen2.5");
        assert_eq!(config.ollama.port, 11500);
        assert_eq!(config.tool_server.command, "python travel_server.py");
        assert_eq!(config.agent_config().generation.max_tokens, 300);
        assert_eq!(config.agent_config().generation.model, "qwen2.5");
    }

    #[test]
    fn test_invalid_values() {
        assert!(RuntimeConfig::from_lookup(lookup(&[("PLANNER_PROVIDER", "gpt")])).is_err());
        assert!(RuntimeConfig::from_lookup(lookup(&[("TOOL_CALL_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn test_blank_key_is_missing_credential() {
        let config = RuntimeConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap();
        let generator = config.generator().unwrap();

        assert!(matches!(
            generator.check_credentials(),
            Err(AgentError::MissingCredential(var)) if var == "GEMINI_API_KEY"
        ));
    }
}
