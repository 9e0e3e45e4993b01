use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::model::ProbeOutcome;

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static URL_CHECKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new("url_checks_total", "Total number of URL checks performed");
    let ctr = IntCounterVec::new(opts, &["status"]).expect("valid url_checks_total metric");
    REGISTRY
        .register(Box::new(ctr.clone()))
        .expect("url_checks_total registered once");
    ctr
});

pub static URL_CHECK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new("url_check_duration_seconds", "Time taken to check URLs");
    let hist = HistogramVec::new(opts, &["status_code"]).expect("valid url_check_duration metric");
    REGISTRY
        .register(Box::new(hist.clone()))
        .expect("url_check_duration_seconds registered once");
    hist
});

pub static ACTIVE_WORKERS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new("url_checker_active_workers", "Number of active worker tasks")
        .expect("valid active workers metric");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("url_checker_active_workers registered once");
    gauge
});

pub static REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "url_checker_requests_in_flight",
        "Number of requests currently being processed",
    )
    .expect("valid requests in flight metric");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("url_checker_requests_in_flight registered once");
    gauge
});

/// Force registration so every series shows up before the first batch.
pub fn initialize_metrics() {
    Lazy::force(&URL_CHECKS_TOTAL);
    Lazy::force(&URL_CHECK_DURATION);
    Lazy::force(&ACTIVE_WORKERS);
    Lazy::force(&REQUESTS_IN_FLIGHT);
}

pub fn observe_outcome(outcome: &ProbeOutcome) {
    let status = if outcome.error.is_some() { "failure" } else { "success" };
    URL_CHECKS_TOTAL.with_label_values(&[status]).inc();

    let code = outcome.status_code.unwrap_or(0).to_string();
    URL_CHECK_DURATION
        .with_label_values(&[code.as_str()])
        .observe(outcome.response_time.as_secs_f64());
}

/// Text exposition of the registry plus its content type.
pub fn encode() -> anyhow::Result<(String, Vec<u8>)> {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buf)?;
    Ok((encoder.format_type().to_string(), buf))
}
