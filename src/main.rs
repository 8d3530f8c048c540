use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use docsift::{config::Config, extraction, routes::create_router, utils::init_logger, AppState};

#[derive(Parser)]
#[command(name = "docsift", version, about = "Document text extraction service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Extract text from a local file and print the result as JSON
    Extract {
        path: PathBuf,
        /// Treat the file as this extension instead of its own, e.g. ".pdf"
        #[arg(long)]
        extension: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_logger(config.logging.log_dir.as_deref());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Extract { path, extension } => extract_file(path, extension).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let addr = config.bind_address();
    let state = AppState::new(config).context("Failed to build application state")?;
    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn extract_file(path: PathBuf, extension: Option<String>) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = match extension {
        Some(ext) if ext.starts_with('.') => ext,
        Some(ext) => format!(".{}", ext),
        None => extraction::extension_of(&path.to_string_lossy()),
    };

    let result = extraction::extract_blocking(bytes.into(), extension).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
