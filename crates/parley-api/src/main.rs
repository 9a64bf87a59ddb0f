//! Parley REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration from the data directory,
//! wires the backends and stores, then serves the HTTP API.

mod http;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use http::router::build_router;
use state::AppState;

#[derive(Parser)]
#[command(name = "parley", version, about = "Dialog orchestration and tool-calling service")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1", env = "PARLEY_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8420, env = "PARLEY_PORT")]
    port: u16,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,parley=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let state = AppState::init().await?;
    tracing::info!(data_dir = %state.data_dir.display(), "state initialized");

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
