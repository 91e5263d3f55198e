//! travel-worker binary
//!
//! Serves the travel tools on stdin/stdout. Logs go to stderr so stdout
//! carries protocol frames only.

use std::sync::Arc;

use tokio::io::{stdin, stdout, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travel_worker::{data::MockTravelData, tools::travel_registry, ToolServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let data = Arc::new(MockTravelData::new());
    let registry = travel_registry(data);
    for tool in registry.descriptors() {
        tracing::debug!("  • {}", tool.name);
    }

    ToolServer::new(registry)
        .serve(BufReader::new(stdin()), stdout())
        .await?;

    Ok(())
}
