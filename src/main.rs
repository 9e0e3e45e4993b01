use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use url_status_probe::api::{self, AppState};
use url_status_probe::config::{Cli, LogFormat, Settings};
use url_status_probe::metrics::initialize_metrics;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli).await?;
    let log_level = settings.get_tracing_level()?;

    // Init tracing with configured log level; RUST_LOG can still add directives
    let filter = EnvFilter::from_default_env().add_directive(
        format!("url_status_probe={}", log_level.as_str().to_lowercase()).parse()?,
    );
    match settings.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    initialize_metrics();

    let port = settings.port;
    println!("URL Status Probe v{}", env!("CARGO_PKG_VERSION"));
    println!("  Dashboard: http://localhost:{}/", port);
    println!("  API:       http://localhost:{}/api/v1/check", port);
    println!("  Health:    http://localhost:{}/api/v1/health", port);
    println!("  Metrics:   http://localhost:{}/metrics", port);

    info!(
        port,
        max_workers = settings.max_workers,
        timeout_ms = settings.default_timeout_ms,
        batch_deadline_ms = settings.batch_deadline_ms,
        log_level = %settings.log_level,
        "server configuration"
    );

    let state = Arc::new(AppState::new(settings)?);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tokio::select! {
        res = api::serve(state, addr) => {
            res?;
            error!("server exited unexpectedly");
        }
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutting down");
        }
    }

    Ok(())
}
