//! Error Types
//!
//! One enum covers the whole agent loop. Each variant belongs to a scope that
//! decides how far it propagates: a failed step is folded into the turn's
//! response, a failed turn is reported and the session continues, a session
//! fault ends the run.

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// How far an error is allowed to propagate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorScope {
    /// Recorded as a failed step result, remaining steps still run
    Step,
    /// Aborts the current turn only
    Turn,
    /// Aborts the whole session
    Session,
}

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Plan Generator credential absent or empty
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Tool Provider advertised zero tools
    #[error("No tools available from the tool provider")]
    NoToolsAvailable,

    /// Plan Generator output could not be parsed into a plan
    #[error("Malformed plan: {reason}")]
    MalformedPlan { reason: String, raw: String },

    /// Plan step names a tool absent from the catalog
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool Provider reported or caused an error for one call
    #[error("Tool call failed: {message}")]
    ToolCallFailed { tool: String, message: String },

    /// Duplex connection to the worker process is broken
    #[error("Tool provider channel failure: {0}")]
    ChannelFailure(String),

    /// Plan Generator (LLM) error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Shorthand for a malformed plan carrying the offending text
    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedPlan {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Shorthand for a failed tool call
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolCallFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Propagation scope of this error
    pub const fn scope(&self) -> ErrorScope {
        match self {
            Self::UnknownTool(_) | Self::ToolCallFailed { .. } => ErrorScope::Step,
            Self::MissingCredential(_) | Self::ChannelFailure(_) | Self::Io(_) => {
                ErrorScope::Session
            }
            Self::NoToolsAvailable
            | Self::MalformedPlan { .. }
            | Self::Provider(_)
            | Self::Config(_)
            | Self::Json(_)
            | Self::Other(_) => ErrorScope::Turn,
        }
    }

    /// Whether the session must stop after this error
    pub const fn is_fatal(&self) -> bool {
        matches!(self.scope(), ErrorScope::Session)
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential(var) => format!(
                "{var} is not set. Please add {var} to your environment or .env file to use the planning agent."
            ),
            Self::NoToolsAvailable => "No tools available from the server.".into(),
            Self::MalformedPlan { reason, raw } => {
                format!("Failed to parse plan: {reason}\nRaw: {raw}")
            }
            Self::UnknownTool(name) => format!("Unknown tool: {name}"),
            Self::ToolCallFailed { message, .. } => format!("Tool call failed: {message}"),
            Self::ChannelFailure(msg) => format!("Lost connection to the tool server: {msg}"),
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::Config(msg) => format!("Configuration error: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
