mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ldap_mcp=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    tracing::debug!(?settings, "Resolved settings");

    match cli.command.tool_call() {
        None => cli::run_mcp_server(&settings).await?,
        Some((name, arguments)) => cli::run_tool(&settings, name, arguments).await?,
    }

    Ok(())
}
