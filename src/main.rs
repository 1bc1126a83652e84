//! Vertical search demo service.
//!
//! Serves an HTML demo UI that runs a query against a hosted vertical search
//! backend and renders direct answers, generated answers and ranked results
//! as cards.
//!
//! # Environment Variables
//! - `HTTP_PORT` - Demo UI port (default: 8501)
//! - `METRICS_PORT` - Prometheus metrics port (default: 9090)
//! - `MOCK_UPSTREAM` - Use fixture clients for testing (default: false)
//! - `DEMOS_FILE` - JSON tenant definitions (default: built-in demos)
//! - `RUST_LOG` - Log level (default: info)

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vertical_search_demo::clients::{http_client, ClientRegistry};
use vertical_search_demo::config::{format_bind_address, Config};
use vertical_search_demo::metrics;
use vertical_search_demo::server::{router, AppState};

/// Run healthcheck mode: query the local /health endpoint.
/// Tries both IPv4 and IPv6 addresses for dual-stack support
async fn run_healthcheck() -> anyhow::Result<()> {
    let port = std::env::var("HTTP_PORT").unwrap_or_else(|_| "8501".to_string());
    let urls = match std::env::var("HEALTH_URL") {
        Ok(url) => vec![url],
        Err(_) => vec![
            format!("http://[::1]:{port}/health"),
            format!("http://127.0.0.1:{port}/health"),
        ],
    };

    let client = http_client(Duration::from_secs(2))?;
    for url in &urls {
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                eprintln!("healthcheck: service is healthy (via {})", url);
                std::process::exit(0);
            }
            Ok(_) | Err(_) => continue,
        }
    }

    eprintln!("healthcheck: failed to reach service via IPv4 or IPv6");
    std::process::exit(1);
}

/// Resolve the UI listen address.
/// Supports: auto-detect, explicit IPv4 (0.0.0.0), IPv6 (::), or dual-stack ([::])
async fn bind_listener(config: &Config) -> anyhow::Result<tokio::net::TcpListener> {
    if config.bind_address == "auto" {
        let dual_stack: SocketAddr = ([0u16; 8], config.http_port).into();
        match tokio::net::TcpListener::bind(dual_stack).await {
            Ok(listener) => {
                info!("Auto-detected dual-stack support, using [::]");
                return Ok(listener);
            }
            Err(_) => {
                info!("IPv6 not available, falling back to IPv4 (0.0.0.0)");
                let addr: SocketAddr = ([0, 0, 0, 0], config.http_port).into();
                return tokio::net::TcpListener::bind(addr)
                    .await
                    .with_context(|| format!("binding {addr}"));
            }
        }
    }

    let bind_str = format_bind_address(&config.bind_address, config.http_port);
    let addr: SocketAddr = bind_str
        .parse()
        .with_context(|| format!("invalid bind address {bind_str}"))?;
    tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (use RUST_LOG env var to control log level)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Check if running in healthcheck mode
    let program_name = std::env::args()
        .next()
        .and_then(|path| {
            std::path::Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_default();

    if program_name == "healthcheck" {
        return run_healthcheck().await;
    }

    info!("Starting vertical search demo service");

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        http_port = config.http_port,
        metrics_port = config.metrics_port,
        mock_upstream = config.mock_upstream,
        demos = config.demos.len(),
        "Configuration loaded"
    );

    let metrics_handle = metrics::init_metrics().context("installing Prometheus recorder")?;

    if config.mock_upstream {
        info!("MOCK_UPSTREAM=true: Serving fixture data instead of calling upstream APIs");
    }
    let http = http_client(config.http_timeout)?;
    let registry = ClientRegistry::new(http, config.endpoints.clone(), config.mock_upstream);

    // Start metrics server in background
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        metrics::start_metrics_server(metrics_port, metrics_handle).await;
    });

    let listener = bind_listener(&config).await?;
    info!(addr = %listener.local_addr()?, "Starting demo UI server");

    let app = router(AppState::new(config, registry));
    axum::serve(listener, app).await?;

    Ok(())
}
