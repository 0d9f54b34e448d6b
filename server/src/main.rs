use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use gateway_server::config::{generate_config_template, load_dotenv, Cli, Config};
use gateway_server::{routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env feeds the env layers, so it has to land before clap reads them
    let dotenv_path = load_dotenv();
    let cli = Cli::parse();

    // Handle --generate-config: print template and exit
    if cli.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load(&cli)?;

    // Initialize tracing/logging
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gateway_server=info"))
    };
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter()).init();
    }

    tracing::info!("Gateway server v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &dotenv_path {
        tracing::info!(path = %path.display(), "Loaded environment from .env");
    }

    let app_state = state::AppState::from_config(&config)?;
    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = config.listen_address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        app_name = %config.app_name,
        chat = config.enable_chat,
        "{} running on http://{}",
        config.app_name,
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C so in-flight requests can finish.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
