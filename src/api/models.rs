use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BatchResult, ProbeOutcome};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckRequest {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
}

/// Wire form of a `ProbeOutcome`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckResult {
    pub checked_at: DateTime<Utc>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
    /// 0 when no response was received
    pub status_code: u16,
    pub available: bool,
}

impl From<&ProbeOutcome> for CheckResult {
    fn from(o: &ProbeOutcome) -> Self {
        Self {
            checked_at: o.observed_at,
            url: o.target.clone(),
            error: o.error.clone(),
            response_time_ms: o.response_time.as_millis() as u64,
            status_code: o.status_code.unwrap_or(0),
            available: o.available,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckResponse {
    pub results: Vec<CheckResult>,
    pub total_checked: usize,
    pub total_available: usize,
    pub total_time_ms: u64,
}

impl From<&BatchResult> for CheckResponse {
    fn from(batch: &BatchResult) -> Self {
        Self {
            results: batch.outcomes.iter().map(CheckResult::from).collect(),
            total_checked: batch.len(),
            total_available: batch.available_count(),
            total_time_ms: batch.total_elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
