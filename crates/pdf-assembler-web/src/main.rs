//! PDF Assembler Web - Web server for merging files into a PDF and converting office documents.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use pdf_assembler_core::AppConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "pdf-assembler-web")]
#[command(author, version, about = "PDF Assembler Web Server", long_about = None)]
struct Args {
    /// Host to bind to (default: 127.0.0.1, or `server.host` from the config file)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (default: 3000, or `server.port` from the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the LibreOffice binary used for office conversion
    #[arg(long, env = "SOFFICE_PATH")]
    soffice: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Build the application router.
fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        // Pages
        .route("/", get(routes::index))
        // API endpoints - binary responses
        .route("/convert", post(routes::convert))
        .route("/api/assemble", post(routes::assemble))
        // Middleware
        // Generated PDFs are one-off downloads
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(soffice) = args.soffice {
        config.converter.binary = soffice;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    info!(
        "Office conversion via {}",
        config.converter.binary.display()
    );

    let state = Arc::new(AppState::new(config));
    let app = app(state);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
