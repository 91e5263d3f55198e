//! Plan Executor
//!
//! Runs plan steps one at a time against the tool provider. A failing step
//! becomes a failed result and the next step still runs; only a broken
//! channel stops execution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::ToolCatalog;
use crate::error::{AgentError, Result};
use crate::memory::MemoryStore;
use crate::plan::{Plan, PlanStep};
use crate::tool::ToolProvider;

/// Why a step failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorKind {
    UnknownTool,
    ToolCallFailed,
}

/// Outcome of one plan step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    Success {
        tool: String,
        text: String,
    },
    Failure {
        tool: String,
        kind: StepErrorKind,
        message: String,
    },
}

impl StepResult {
    pub fn success(tool: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Success {
            tool: tool.into(),
            text: text.into(),
        }
    }

    pub fn unknown_tool(tool: impl Into<String>) -> Self {
        let tool = tool.into();
        Self::Failure {
            message: format!("tool '{tool}' is not in the catalog"),
            tool,
            kind: StepErrorKind::UnknownTool,
        }
    }

    pub fn failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            tool: tool.into(),
            kind: StepErrorKind::ToolCallFailed,
            message: message.into(),
        }
    }

    pub fn tool(&self) -> &str {
        match self {
            Self::Success { tool, .. } | Self::Failure { tool, .. } => tool,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub const fn error_kind(&self) -> Option<StepErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Text shown to the user for this step
    pub fn render(&self) -> String {
        match self {
            Self::Success { text, .. } => text.clone(),
            Self::Failure {
                tool,
                kind: StepErrorKind::UnknownTool,
                ..
            } => AgentError::UnknownTool(tool.clone()).user_message(),
            Self::Failure {
                tool,
                kind: StepErrorKind::ToolCallFailed,
                message,
            } => AgentError::tool_failed(tool.as_str(), message.as_str()).user_message(),
        }
    }
}

/// Join step results into the turn's response text
pub fn join_results(results: &[StepResult]) -> String {
    results
        .iter()
        .map(StepResult::render)
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct PlanExecutor {
    provider: Arc<dyn ToolProvider>,
}

impl PlanExecutor {
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self { provider }
    }

    /// Execute every step in order, returning one result per step.
    ///
    /// Steps naming a tool outside `catalog` never reach the provider and
    /// leave memory untouched. Every dispatched call is recorded in `memory`
    /// whether or not it succeeded. A `ChannelFailure` aborts execution and
    /// the results gathered so far are dropped.
    pub async fn execute(
        &self,
        plan: &Plan,
        catalog: &ToolCatalog,
        memory: &mut MemoryStore,
    ) -> Result<Vec<StepResult>> {
        let mut results = Vec::with_capacity(plan.len());

        for (index, step) in plan.iter().enumerate() {
            if !catalog.contains(&step.tool_name) {
                tracing::warn!(step = index, tool = %step.tool_name, "Plan step names unknown tool");
                results.push(StepResult::unknown_tool(&step.tool_name));
                continue;
            }

            tracing::debug!(step = index, tool = %step.tool_name, "Executing tool");
            let outcome = self.dispatch(step).await;
            memory.record(step.tool_name.clone(), step.arguments.clone());

            let result = match outcome {
                Ok(text) => StepResult::success(&step.tool_name, text),
                Err(AgentError::ChannelFailure(msg)) => {
                    tracing::error!(step = index, tool = %step.tool_name, "Tool channel failed: {}", msg);
                    return Err(AgentError::ChannelFailure(msg));
                }
                Err(AgentError::ToolCallFailed { message, .. }) => {
                    tracing::warn!(step = index, tool = %step.tool_name, "Tool call failed: {}", message);
                    StepResult::failed(&step.tool_name, message)
                }
                Err(e) => {
                    tracing::warn!(step = index, tool = %step.tool_name, "Tool call failed: {}", e);
                    StepResult::failed(&step.tool_name, e.to_string())
                }
            };
            results.push(result);
        }

        Ok(results)
    }

    async fn dispatch(&self, step: &PlanStep) -> Result<String> {
        let output = self.provider.call_tool(&step.tool_name, &step.arguments).await?;
        let text = output.to_text();

        if output.is_error {
            return Err(AgentError::tool_failed(step.tool_name.as_str(), text));
        }
        Ok(text)
    }
}
