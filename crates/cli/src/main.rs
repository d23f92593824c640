mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mcp::{HostConfig, McpHost};
use runtime::{ChatService, GeminiDecider};
use server::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "gangway.toml";

#[derive(Parser)]
#[command(name = "gangway")]
#[command(about = "Backend gateway connecting chat to MCP tool servers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let api_key = config.api_key()?;

    let host = Arc::new(McpHost::new(HostConfig {
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    }));
    let decider = GeminiDecider::builder(api_key, &config.decider.model).build();
    let chat = ChatService::new(Arc::clone(host.registry()), decider);
    let state = Arc::new(AppState { host, chat });

    let app = server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(%bind, model = %config.decider.model, "gangway listening");

    axum::serve(listener, app).await?;
    Ok(())
}
