//! Plans
//!
//! A plan is the ordered list of tool invocations the LLM proposes for one
//! query. The parser only checks shape; whether a named tool exists is
//! decided by the executor.
//!
//! Exactly one response shape is accepted:
//!
//! ```text
//! {"plan": [{"tool": "<name>", "arguments": {...}}, ...]}
//! ```
//!
//! A bare `{"tool": ..., "arguments": ...}` object is rejected.

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::tool::ToolArguments;

const FENCE: &str = "```";

/// One tool invocation in a plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Tool identifier, checked against the catalog at execution time
    #[serde(rename = "tool")]
    pub tool_name: String,

    /// Passed through to the provider unchanged
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl PlanStep {
    pub fn new(tool_name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Ordered tool invocations for one query. May be empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "plan")]
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Parse the LLM's raw output into a plan.
    ///
    /// Surrounding whitespace and a markdown code fence (with or without a
    /// language tag) are stripped first. Anything else that is not exactly
    /// the plan shape fails with `MalformedPlan` carrying `raw`.
    pub fn parse(raw: &str) -> Result<Self> {
        let body = strip_code_fence(raw);

        serde_json::from_str::<Self>(body).map_err(|e| AgentError::malformed(e.to_string(), raw))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanStep> {
        self.steps.iter()
    }
}

/// Remove a wrapping markdown fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with(FENCE) {
        return text;
    }

    // Opening fence line may carry a language tag (```json).
    let body = match text.find('\n') {
        Some(newline) => &text[newline + 1..],
        None => "",
    };
    let body = body.trim_end();
    body.strip_suffix(FENCE).unwrap_or(body).trim()
}
