//! Test doubles for the two external roles.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::tool::{ToolArguments, ToolDescriptor, ToolOutput, ToolProvider};

pub fn travel_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_weather",
            "Get weather details for a city",
            json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        ),
        ToolDescriptor::new(
            "get_flight_details",
            "Fetch flight details between two airports",
            json!({
                "type": "object",
                "properties": {
                    "origin": {"type": "string"},
                    "destination": {"type": "string"},
                    "date": {"type": "string"}
                },
                "required": ["origin", "destination", "date"]
            }),
        ),
    ]
}

/// Tool provider with scripted listings and per-tool responses.
///
/// Tools without a scripted response answer `"<tool> ok"`.
#[derive(Default)]
pub struct FakeToolProvider {
    tools: Mutex<Vec<ToolDescriptor>>,
    responses: Mutex<HashMap<String, VecDeque<Result<ToolOutput>>>>,
    calls: Mutex<Vec<(String, ToolArguments)>>,
    list_count: AtomicUsize,
    shut_down: AtomicBool,
}

impl FakeToolProvider {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools: Mutex::new(tools),
            ..Default::default()
        }
    }

    pub fn respond(self, tool: &str, response: Result<ToolOutput>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(tool.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn set_tools(&self, tools: Vec<ToolDescriptor>) {
        *self.tools.lock().unwrap() = tools;
    }

    pub fn calls(&self) -> Vec<(String, ToolArguments)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_count(&self) -> usize {
        self.list_count.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolProvider for FakeToolProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.list_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.tools.lock().unwrap().clone())
    }

    async fn call_tool(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(name)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(ToolOutput::text(format!("{name} ok"))))
    }

    async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Plan generator returning canned text in order, then `{"plan": []}`.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    options: Mutex<Vec<GenerationOptions>>,
    credential: Option<&'static str>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok((*r).to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
            credential: Some("test-key"),
        }
    }

    pub fn failing_with(self, error: AgentError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn without_credential(mut self) -> Self {
        self.credential = None;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<GenerationOptions> {
        self.options.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn check_credentials(&self) -> Result<()> {
        match self.credential {
            Some(_) => Ok(()),
            None => Err(AgentError::MissingCredential("TEST_API_KEY".into())),
        }
    }

    async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);
        self.options.lock().unwrap().push(options.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"plan": []}"#.to_string()))?;
        Ok(Completion::text(reply, options.model.clone()))
    }
}
