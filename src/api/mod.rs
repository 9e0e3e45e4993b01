//! HTTP surface: check API, health, Prometheus metrics and the dashboard.
//!
//! | route                 | method | handler          |
//! |-----------------------|--------|------------------|
//! | `/api/v1/check`       | POST   | run one batch    |
//! | `/api/v1/health`      | GET    | liveness/uptime  |
//! | `/metrics`            | GET    | text exposition  |
//! | `/`                   | GET    | static dashboard |

use anyhow::{Context, Result};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use warp::Filter;

use crate::config::Settings;
use crate::prober::HttpProber;

pub mod handlers;
pub mod models;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Shared by every request. One prober (and its connection pool) serves all batches.
pub struct AppState {
    pub settings: Settings,
    pub prober: Arc<HttpProber>,
    pub started: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let prober = HttpProber::new(&settings.user_agent)?;
        Ok(Self {
            settings,
            prober: Arc::new(prober),
            started: Instant::now(),
        })
    }
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let check = warp::path!("api" / "v1" / "check")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::handle_check);

    let health = warp::path!("api" / "v1" / "health")
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::handle_health);

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .and_then(handlers::handle_metrics);

    let dashboard = warp::path::end()
        .and(warp::get())
        .and_then(handlers::handle_dashboard);

    check.or(health).or(metrics).or(dashboard)
}

/// One `info` event per answered request, rejections included.
pub fn access_log() -> warp::log::Log<impl Fn(warp::log::Info<'_>) + Clone> {
    warp::log::custom(|info| {
        tracing::info!(
            method = %info.method(),
            path = %info.path(),
            status = info.status().as_u16(),
            elapsed_ms = info.elapsed().as_millis() as u64,
            "request"
        );
    })
}

/// Bind `addr` and answer requests until the task is dropped.
///
/// A bind failure (port taken, no permission) is returned, not panicked on.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    let app = routes(state)
        .recover(handlers::handle_rejection)
        .with(access_log());

    tracing::info!(%addr, "starting server");
    warp::serve(app).incoming(listener).run().await;
    Ok(())
}
