use anyhow::Context;
use clap::Parser;
use hc50::api::AppState;
use hc50::cli::{model, Cli, Commands};
use hc50::config::{AppConfig, LoggingConfig};
use hc50::services::build_context;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match AppConfig::load_from(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {} - using defaults", e);
            AppConfig::default_config("best_model.json")
        }
    };
    if let Some(weights) = &cli.weights {
        config.model.weights_path = weights.clone();
    }

    match &cli.command {
        Commands::Serve { host, port } => {
            init_logging(&config.logging);
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            run_server(config).await?;
        }
        Commands::Predict { file, pretty } => {
            init_logging_simple();
            model::predict_file(&config, file, *pretty)?;
        }
        Commands::Evaluate { file } => {
            init_logging_simple();
            model::evaluate_file(&config, file)?;
        }
        Commands::InspectModel => {
            init_logging_simple();
            model::inspect_model(&config)?;
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting HC50 prediction service");

    // A worker that cannot load its model never starts serving.
    let ctx = match build_context(&config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Startup aborted: {}", e);
            return Err(e).context("worker failed to become ready");
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    hc50::adapters::start_api_server(AppState::ready(ctx), addr, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hc50=debug", config.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_logging_simple() {
    // Minimal logging for CLI commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received");
}
