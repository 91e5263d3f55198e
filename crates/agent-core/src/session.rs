//! Session Loop
//!
//! One session owns a tool catalog and a memory store and resolves queries
//! strictly one at a time: refresh catalog, build prompt, ask the LLM for a
//! plan, parse it, execute it. Step failures end up in the response text,
//! turn failures are reported and the loop keeps reading, session failures
//! end the loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::catalog::ToolCatalog;
use crate::error::{AgentError, Result};
use crate::executor::{join_results, PlanExecutor, StepResult};
use crate::memory::MemoryStore;
use crate::message::Message;
use crate::plan::Plan;
use crate::prompt::{PlanPromptBuilder, DEFAULT_PREAMBLE};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::ToolProvider;

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Role preamble opening every planning prompt
    pub preamble: String,

    /// Generation options for the plan request
    pub generation: GenerationOptions,

    /// Inputs that end the session, compared case-insensitively
    pub exit_keywords: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.into(),
            generation: GenerationOptions::default(),
            exit_keywords: vec!["exit".into(), "quit".into()],
        }
    }
}

pub struct Session {
    id: SessionId,
    tools: Arc<dyn ToolProvider>,
    generator: Arc<dyn LlmProvider>,
    config: AgentConfig,
    prompt: PlanPromptBuilder,
    executor: PlanExecutor,
    catalog: ToolCatalog,
    memory: MemoryStore,
    created_at: DateTime<Utc>,
    turns: usize,
}

impl Session {
    /// Create a session, refusing to start without generator credentials.
    pub fn start(
        tools: Arc<dyn ToolProvider>,
        generator: Arc<dyn LlmProvider>,
        config: AgentConfig,
    ) -> Result<Self> {
        generator.check_credentials()?;

        let id = SessionId::new();
        tracing::info!(session = %id, provider = generator.name(), model = %config.generation.model, "Session started");

        Ok(Self {
            id,
            prompt: PlanPromptBuilder::new(config.preamble.clone()),
            executor: PlanExecutor::new(tools.clone()),
            tools,
            generator,
            config,
            catalog: ToolCatalog::new(),
            memory: MemoryStore::new(),
            created_at: Utc::now(),
            turns: 0,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn duration(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Whether `input` is one of the exit keywords
    pub fn is_exit(&self, input: &str) -> bool {
        let input = input.trim();
        self.config
            .exit_keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case(input))
    }

    /// Re-list tools from the provider
    pub async fn refresh_catalog(&mut self) -> Result<&ToolCatalog> {
        self.catalog.refresh(self.tools.as_ref()).await?;
        Ok(&self.catalog)
    }

    /// Resolve one query into ordered step results.
    pub async fn run_turn(&mut self, query: &str) -> Result<Vec<StepResult>> {
        self.turns += 1;
        tracing::info!(session = %self.id, turn = self.turns, "Planning query");

        self.refresh_catalog().await?;

        let prompt = self.prompt.build(query, &self.catalog, &self.memory);
        let completion = self
            .generator
            .complete(&[Message::user(prompt)], &self.config.generation)
            .await?;
        tracing::debug!(raw = %completion.content, "Plan decision");
        if completion.truncated() {
            tracing::warn!("Plan response hit the output token limit");
        }

        let plan = Plan::parse(&completion.content)?;
        tracing::info!(steps = plan.len(), "Executing plan");

        self.executor
            .execute(&plan, &self.catalog, &mut self.memory)
            .await
    }

    /// Resolve one query into the text shown to the user.
    ///
    /// Turn-level errors are rendered into the response; session-level
    /// errors are returned.
    pub async fn respond(&mut self, query: &str) -> Result<String> {
        match self.run_turn(query).await {
            Ok(results) if results.is_empty() => Ok("No actions were planned for this query.".into()),
            Ok(results) => Ok(join_results(&results)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(session = %self.id, turn = self.turns, "Turn aborted: {}", e);
                Ok(e.user_message())
            }
        }
    }

    /// Read queries line by line until an exit keyword or end of input.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        loop {
            output.write_all(b"\nUser: ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if self.is_exit(query) {
                output.write_all(b"Exiting agent.\n").await?;
                break;
            }

            let response = self.respond(query).await?;
            output
                .write_all(format!("\nAgent Result:\n{response}\n").as_bytes())
                .await?;
        }

        output.flush().await?;
        tracing::info!(session = %self.id, turns = self.turns, "Session ended");
        Ok(())
    }

    /// End the session and close the tool channel.
    ///
    /// Memory and catalog go away with the session.
    pub async fn close(self) -> Result<()> {
        tracing::info!(session = %self.id, elapsed_secs = self.duration().num_seconds(), "Closing tool channel");
        self.tools.shutdown().await
    }
}

/// Builder for sessions
pub struct SessionBuilder {
    tools: Option<Arc<dyn ToolProvider>>,
    generator: Option<Arc<dyn LlmProvider>>,
    config: AgentConfig,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            tools: None,
            generator: None,
            config: AgentConfig::default(),
        }
    }

    pub fn tools(mut self, tools: Arc<dyn ToolProvider>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn LlmProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.config.preamble = preamble.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn max_output_tokens(mut self, max: u32) -> Self {
        self.config.generation.max_tokens = max;
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn exit_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.exit_keywords = keywords;
        self
    }

    pub fn build(self) -> Result<Session> {
        let tools = self
            .tools
            .ok_or_else(|| AgentError::Config("Tool provider is required".into()))?;
        let generator = self
            .generator
            .ok_or_else(|| AgentError::Config("Plan generator is required".into()))?;

        Session::start(tools, generator, self.config)
    }
}
