use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::Rejection;

use super::models::{CheckRequest, CheckResponse, ErrorBody, HealthResponse};
use super::AppState;
use crate::engine::run_batch;
use crate::error::ConfigError;
use crate::metrics;
use crate::model::BatchRequest;
use crate::util::format_uptime;

const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");

#[derive(Debug)]
pub enum ApiError {
    EmptyUrls,
    TooManyUrls(usize),
    Batch(ConfigError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::EmptyUrls => write!(f, "urls field is required and must not be empty"),
            ApiError::TooManyUrls(max) => write!(f, "maximum {} URLs allowed per request", max),
            ApiError::Batch(e) => write!(f, "invalid batch: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

/// Validate a check request, run it as one batch and record metrics.
pub async fn check_urls(state: &AppState, req: CheckRequest) -> Result<CheckResponse, ApiError> {
    let settings = &state.settings;
    if req.urls.is_empty() {
        return Err(ApiError::EmptyUrls);
    }
    if req.urls.len() > settings.max_urls_per_request {
        return Err(ApiError::TooManyUrls(settings.max_urls_per_request));
    }

    let timeout = req
        .timeout_ms
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
        .unwrap_or_else(|| settings.default_timeout());
    let max_workers = req
        .max_workers
        .filter(|&n| n > 0)
        .unwrap_or(settings.max_workers);

    let request = BatchRequest::new(req.urls, timeout, max_workers)
        .with_deadline(settings.batch_deadline());
    let result = run_batch(state.prober.clone(), request)
        .await
        .map_err(ApiError::Batch)?;

    for outcome in &result.outcomes {
        metrics::observe_outcome(outcome);
    }
    Ok(CheckResponse::from(&result))
}

pub async fn handle_check(req: CheckRequest, state: Arc<AppState>) -> Result<Response, Rejection> {
    let _in_flight = InFlight::enter();

    match check_urls(&state, req).await {
        Ok(resp) => Ok(warp::reply::json(&resp).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "rejected check request");
            Ok(error_reply(e.status(), e.to_string()))
        }
    }
}

pub async fn handle_health(state: Arc<AppState>) -> Result<Response, Rejection> {
    let resp = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: format_uptime(state.started.elapsed()),
        time: chrono::Utc::now(),
    };
    Ok(warp::reply::json(&resp).into_response())
}

pub async fn handle_metrics() -> Result<Response, Rejection> {
    match metrics::encode() {
        Ok((content_type, body)) => {
            Ok(warp::reply::with_header(body, "Content-Type", content_type).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub async fn handle_dashboard() -> Result<Response, Rejection> {
    Ok(warp::reply::html(DASHBOARD_HTML).into_response())
}

/// Turn body decoding failures into JSON 400s; everything else keeps warp's answer.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Rejection> {
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        tracing::warn!(error = %e, "failed to decode request");
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            format!("invalid request body: {}", e),
        ));
    }
    Err(err)
}

pub fn error_reply(status: StatusCode, message: String) -> Response {
    let body = warp::reply::json(&ErrorBody { error: message });
    warp::reply::with_status(body, status).into_response()
}

struct InFlight;

impl InFlight {
    fn enter() -> Self {
        metrics::REQUESTS_IN_FLIGHT.inc();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::REQUESTS_IN_FLIGHT.dec();
    }
}
