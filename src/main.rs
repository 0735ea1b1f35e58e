//! Local development server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ request id ─▶ rewrite ─┬─ redirect ──▶ 303
//!                                        ├─ proxy ─────▶ upstream (hyper client)
//!                                        └─ rewrite / no match
//!                                              │
//!                                              ▼
//!                                           preview ───▶ renderer(template, fixture data)
//!                                              │
//!                                              ▼
//!                                           script ────▶ fixture JSON / script handler
//!                                              │
//!                                              ▼
//!                                         inner service (404)
//!
//!     rule files ──▶ parser ──▶ RuleStore (per request | watch | startup)
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use preview_server::config::{load_config, ServerConfig};
use preview_server::config::validation::validate_config;
use preview_server::http::HttpServer;
use preview_server::lifecycle::Shutdown;
use preview_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "preview-server")]
#[command(
    about = "Local development server with rewrite rules, template preview and fixtures",
    long_about = None
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(short, long)]
    listen: Option<String>,

    /// Rule file; repeat for several
    #[arg(short, long = "rules")]
    rules: Vec<PathBuf>,

    /// Template root
    #[arg(long)]
    views: Option<PathBuf>,

    /// Fixture data root; repeat for several
    #[arg(short, long = "data")]
    data: Vec<PathBuf>,
}

impl Cli {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if !self.rules.is_empty() {
            config.rewrite.rule_files = self.rules;
        }
        if let Some(views) = self.views {
            config.fixtures.view_path = views;
        }
        if !self.data.is_empty() {
            config.fixtures.data_paths = self.data;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();

    let config = match cli.config.take() {
        Some(path) => load_config(&path)?,
        None => ServerConfig::default(),
    };
    let config = cli.apply(config);
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("Invalid configuration: {error}");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    logging::init_logging(&config.observability);

    tracing::info!("preview-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rule_files = ?config.rewrite.rule_files,
        reload = ?config.rewrite.reload,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
