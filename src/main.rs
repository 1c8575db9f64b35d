//! vector-view - Entry point for the vector store browser

use clap::Parser;
use vector_view::Cli;

#[tokio::main]
async fn main() {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "Starting vector-view");

    if let Err(e) = cli.run().await {
        tracing::error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
