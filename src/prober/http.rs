use anyhow::Result;
use reqwest::{Client, Url, redirect};
use std::fmt::Write;
use tokio::time::{Duration, Instant, timeout};
use tokio_util::sync::CancellationToken;

use super::Probe;
use crate::error::ProbeError;
use crate::model::ProbeOutcome;

pub const DEFAULT_USER_AGENT: &str = "URL-Status-Checker/1.0";

/// HTTP GET prober. Redirects are not followed; a 3xx is the final answer.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl Probe for HttpProber {
    async fn probe(
        &self,
        target: &str,
        limit: Duration,
        cancel: &CancellationToken,
    ) -> ProbeOutcome {
        let start = Instant::now();

        let url = match parse_target(target) {
            Ok(url) => url,
            Err(e) => return ProbeOutcome::failed(target.to_string(), &e, start.elapsed()),
        };

        let request = self.client.get(url).send();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            res = timeout(limit, request) => match res {
                // headers are in; the body is never read
                Ok(Ok(resp)) => Ok(resp.status().as_u16()),
                Ok(Err(e)) => Err(classify(&e, limit)),
                Err(_) => Err(ProbeError::Timeout(limit)),
            },
        };
        let elapsed = start.elapsed();

        match result {
            Ok(status) => {
                tracing::debug!(
                    url = %target,
                    status,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "probe responded"
                );
                ProbeOutcome::responded(target.to_string(), status, elapsed)
            }
            Err(e) => {
                tracing::debug!(
                    url = %target,
                    error = %e,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "probe failed"
                );
                ProbeOutcome::failed(target.to_string(), &e, elapsed)
            }
        }
    }
}

fn parse_target(target: &str) -> Result<Url, ProbeError> {
    let url = Url::parse(target.trim())
        .map_err(|e| ProbeError::MalformedTarget(format!("{}: {}", target, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProbeError::MalformedTarget(format!(
            "{}: unsupported scheme '{}'",
            target, other
        ))),
    }
}

fn classify(err: &reqwest::Error, limit: Duration) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Timeout(limit)
    } else if err.is_builder() {
        ProbeError::MalformedTarget(report(err))
    } else {
        ProbeError::ConnectionFailure(report(err))
    }
}

// reqwest hides the interesting part (refused, dns) in the source chain
fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = err.to_string();
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}
