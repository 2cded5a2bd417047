use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use schools_web::config::ServerConfig;
use schools_web::state::AppState;

#[derive(Parser)]
#[command(
    name = "schools-web",
    about = "Registers schools and lists them by distance from a location"
)]
struct Cli {
    /// Path to config file (default: ~/.config/schools/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Environment profile: prod or dev
    #[arg(long)]
    env: Option<String>,

    /// Port to listen on (overrides config and PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_ref(), cli.env.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    info!(
        env = %config.env,
        backend = %config.database.backend(),
        "loaded config"
    );

    let state = AppState::connect(&config.database).await;
    let app = schools_web::build_router(state);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("schools-web listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received ctrl-c, shutting down"),
        Err(e) => {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
