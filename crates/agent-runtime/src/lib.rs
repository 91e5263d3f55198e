//! # agent-runtime
//!
//! Concrete collaborators for the agent loop.
//!
//! ## Tool providers
//!
//! - **Stdio**: a worker process spoken to over stdin/stdout (JSON-RPC 2.0,
//!   MCP method names)
//!
//! ## Plan generators
//!
//! - **Gemini** (default): Google Generative Language API, needs `GEMINI_API_KEY`
//! - **Ollama** (feature `ollama`): local inference, no credential
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{RuntimeConfig, StdioToolProvider};
//!
//! let config = RuntimeConfig::from_env()?;
//! let tools = StdioToolProvider::spawn(&config.tool_server.command, config.tool_server.timeout()).await?;
//! let session = Session::start(Arc::new(tools), config.generator()?, config.agent_config())?;
//! ```

pub mod config;
pub mod gemini;
pub mod stdio;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use config::{ProviderKind, RuntimeConfig, ToolServerConfig};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use stdio::StdioToolProvider;

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Result, Session, SessionBuilder, ToolProvider};
