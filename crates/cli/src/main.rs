mod config;
mod error;

use std::sync::Arc;

use clap::Parser;
use mcp::{Server, ServerConfig};
use resend::ResendClient;
use sse::AppState;
use tools::EmailTools;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::{Cli, Config, Transport};
use error::Result;

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr; stdout carries the pipe transport.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

async fn run() -> Result<()> {
    let config = Config::load(Cli::parse())?;

    let gateway = ResendClient::new(config.api_key);
    let tools = EmailTools::new(gateway, config.defaults)?;
    let server = Server::new(ServerConfig::default(), tools);

    match config.transport {
        Transport::Pipe => {
            mcp::serve_stdio(&server).await?;
        }
        Transport::Http => {
            let http = config.http;
            let listener = sse::bind(&http.host, http.port).await?;
            let state = Arc::new(AppState::new(server, http.origin_policy));
            sse::serve(listener, state, shutdown_signal()).await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
