//! Screenwing HTTP server
//!
//! Starts an Axum web server that relays extension requests to the Gemini
//! API through the key pool and retry orchestrator.

use clap::Parser;
use screenwing::cli::{generate_config_template, Cli, Command};
use screenwing::config::{self, Config};
use screenwing::{handlers, telemetry};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // A missing config file is fine: every setting has a default. A present
    // but malformed file is a startup error.
    let mut config = if std::path::Path::new(&cli.config).exists() {
        Config::from_file(&cli.config)?
    } else {
        Config::default()
    };
    config.apply_env_overrides();

    telemetry::init(&config.observability.log_level);

    let keys = config::keys_from_env();
    let host = config.server.host.clone();
    let port = config.server.port;

    let state = handlers::AppState::new(config, keys)?;

    tracing::info!(
        total_keys = state.pool().len(),
        "Starting Screenwing relay on {}:{}",
        host,
        port
    );

    let app = handlers::router(state);

    let addr = SocketAddr::from((
        host.parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
