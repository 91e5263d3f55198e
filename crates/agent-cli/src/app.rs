//! Session driver
//!
//! Builds the plan generator, connects the tool server, prints what it
//! offers and runs the REPL until the input ends or `cancel` resolves.
//!
//! Only a tool server that cannot be reached, or that goes away mid-session,
//! ends in [`Outcome::Failed`]. Configuration problems and a missing
//! credential are reported to the operator and end normally.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

use agent_core::{AgentConfig, AgentError, LlmProvider, Session, ToolProvider};
use agent_runtime::{RuntimeConfig, StdioToolProvider};

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Tool server unreachable at startup or lost mid-session
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => Self::SUCCESS,
            Outcome::Failed => Self::FAILURE,
        }
    }
}

/// Start everything `config` describes and run one session.
pub async fn run<R, W, C>(config: &RuntimeConfig, input: R, mut output: W, cancel: C) -> anyhow::Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Future<Output = ()>,
{
    let generator = match config.generator() {
        Ok(generator) => generator,
        Err(e) => {
            tracing::error!("Could not create plan generator: {}", e);
            output.write_all(format!("{}\n", e.user_message()).as_bytes()).await?;
            output.flush().await?;
            return Ok(Outcome::Completed);
        }
    };

    let command = &config.tool_server.command;
    let tools = match StdioToolProvider::spawn(command, config.tool_server.timeout()).await {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            tracing::error!(%command, "Could not start tool server: {}", e);
            eprintln!("Failed to connect to tool server '{command}': {e}");
            return Ok(Outcome::Failed);
        }
    };

    run_session(tools, generator, config.agent_config(), input, output, cancel).await
}

/// Run the REPL over an already connected tool provider.
///
/// When `cancel` resolves first, the in-flight turn is dropped together with
/// its partial results and the provider is shut down.
pub async fn run_session<R, W, C>(
    tools: Arc<dyn ToolProvider>,
    generator: Arc<dyn LlmProvider>,
    config: AgentConfig,
    input: R,
    mut output: W,
    cancel: C,
) -> anyhow::Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Future<Output = ()>,
{
    let mut session = match Session::start(tools.clone(), generator, config) {
        Ok(session) => session,
        Err(e @ AgentError::MissingCredential(_)) => {
            output.write_all(format!("{}\n", e.user_message()).as_bytes()).await?;
            output.flush().await?;
            tools.shutdown().await?;
            return Ok(Outcome::Completed);
        }
        Err(e) => {
            tools.shutdown().await.ok();
            return Err(e.into());
        }
    };

    let listing = session.refresh_catalog().await.map(|catalog| {
        catalog
            .iter()
            .map(|tool| format!("- {} → {}", tool.name, tool.description))
            .collect::<Vec<_>>()
    });

    let mut banner = String::from("Connected to tool server\n");
    match listing {
        Ok(lines) => {
            for line in lines {
                banner.push_str(&line);
                banner.push('\n');
            }
        }
        Err(e) if e.is_fatal() => return Ok(abort(session, &e).await),
        Err(e) => {
            banner.push_str(&e.user_message());
            banner.push('\n');
        }
    }
    banner.push_str("\nType your query (or 'exit' to quit):\n");
    output.write_all(banner.as_bytes()).await?;

    let finished = tokio::select! {
        result = session.run(input, &mut output) => Some(result),
        () = cancel => None,
    };

    match finished {
        Some(Ok(())) => {
            session.close().await?;
            Ok(Outcome::Completed)
        }
        Some(Err(e)) => Ok(abort(session, &e).await),
        None => {
            tracing::info!(session = %session.id(), "Interrupted");
            eprintln!("\nInterrupted, closing tool server.");
            session.close().await?;
            Ok(Outcome::Completed)
        }
    }
}

/// Report a session-level fault and close the channel
async fn abort(session: Session, error: &AgentError) -> Outcome {
    tracing::error!(session = %session.id(), "Session aborted: {}", error);
    eprintln!("{}", error.user_message());
    if let Err(e) = session.close().await {
        tracing::warn!("Tool server shutdown failed: {}", e);
    }
    Outcome::Failed
}
