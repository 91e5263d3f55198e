//! Command-line arguments
//!
//! Flags override the environment-derived `RuntimeConfig`.

use agent_runtime::{ProviderKind, RuntimeConfig};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "travel-agent",
    about = "Plan-and-execute travel agent over a stdio tool server",
    version
)]
pub struct Cli {
    /// Command line that starts the tool server
    #[arg(long, env = "TOOL_SERVER_COMMAND")]
    pub server: Option<String>,

    /// Plan generator backend (gemini, ollama)
    #[arg(long, env = "PLANNER_PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Model used for planning
    #[arg(long)]
    pub model: Option<String>,

    /// Output token budget for one plan
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Per tool call timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Enable verbose logging (includes the raw plan text)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn apply(&self, config: &mut RuntimeConfig) {
        // Provider first: the model override targets the selected backend.
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(model) = &self.model {
            config.set_model(model.clone());
        }
        if let Some(server) = &self.server {
            config.tool_server.command.clone_from(server);
        }
        if let Some(max) = self.max_output_tokens {
            config.max_output_tokens = max;
        }
        if let Some(secs) = self.timeout_secs {
            config.tool_server.timeout_secs = secs;
        }
    }

    pub const fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
