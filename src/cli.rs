//! Command-line interface
//!
//! Argument parsing and subcommand handling for the screenwing binary.

use clap::{Parser, Subcommand};

/// Screen-aware AI relay for the Screenwing browser extension
#[derive(Parser)]
#[command(name = "screenwing")]
#[command(version)]
#[command(about = "Screen-aware AI relay for the Screenwing browser extension")]
#[command(
    long_about = "Screenwing relays screen captures and prompts from the browser extension \
    to the Gemini API, rotating across a pool of API keys with health tracking, \
    blacklisting, and retry."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Screenwing Configuration
# ========================
#
# This file configures the HTTP server, the upstream Gemini provider, and
# observability settings.
#
# API keys are NOT configured here. They are read from environment variables
# at startup: GEMINI_API_KEY, GEMINI_API_KEY_2, GEMINI_API_KEY_3, ...
# At least one key must be set or the server refuses to start.

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Per-attempt timeout for upstream provider calls, in seconds.
# A timed-out attempt counts as a service failure and is retried.
request_timeout_seconds = 30

[provider]
# Gemini API base URL (override for testing against a mock server)
base_url = "https://generativelanguage.googleapis.com"

# Model identifier. Can also be overridden with the GEMINI_MODEL env var.
model = "gemini-2.5-flash"

# Sampling parameters, fixed per deployment
temperature = 0.7
top_k = 40
top_p = 0.95

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# When true, failure responses include a technicalError field with the raw
# provider error message. Keep off in production.
expose_technical_errors = false

# Prometheus metrics are always available at /metrics on the server port
# For production, consider using a reverse proxy to restrict access
"#
}
