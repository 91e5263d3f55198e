//! # agent-core
//!
//! Tool-orchestration agent loop: discover the tools a worker process
//! offers, ask an LLM for a multi-step plan, run the plan against the
//! worker, remember what was called.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Session                               │
//! │  ┌──────────────┐  ┌─────────────┐  ┌──────────┐  ┌───────────┐  │
//! │  │ ToolCatalog  │─▶│ PlanPrompt  │─▶│   Plan   │─▶│   Plan    │  │
//! │  │ MemoryStore  │  │  Builder    │  │  Parser  │  │ Executor  │  │
//! │  └──────────────┘  └──────┬──────┘  └──────────┘  └─────┬─────┘  │
//! │                           │                             │        │
//! │                    ┌──────▼──────┐               ┌──────▼──────┐ │
//! │                    │ LlmProvider │               │ToolProvider │ │
//! │                    │ (Strategy)  │               │ (Strategy)  │ │
//! │                    └─────────────┘               └─────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both providers are traits handed in by the caller; this crate does no
//! process or network I/O of its own.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod memory;
pub mod message;
pub mod plan;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod tool;

#[cfg(test)]
mod testing;

pub use catalog::ToolCatalog;
pub use error::{AgentError, ErrorScope, Result};
pub use executor::{join_results, PlanExecutor, StepErrorKind, StepResult};
pub use memory::MemoryStore;
pub use message::{Message, Role};
pub use plan::{Plan, PlanStep};
pub use prompt::PlanPromptBuilder;
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use session::{AgentConfig, Session, SessionBuilder, SessionId};
pub use tool::{ContentPart, ToolArguments, ToolDescriptor, ToolOutput, ToolProvider};
