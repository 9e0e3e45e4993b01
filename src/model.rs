use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProbeError;

/// A URL to check. Opaque to the engine; only the prober interprets it.
pub type Target = String;

/// Recorded result of probing one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeOutcome {
    pub target: Target,
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub available: bool,
    pub error: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl ProbeOutcome {
    /// A response was received. Availability follows the status class.
    pub fn responded(target: Target, status_code: u16, response_time: Duration) -> Self {
        Self {
            target,
            status_code: Some(status_code),
            response_time,
            available: (200..400).contains(&status_code),
            error: None,
            observed_at: Utc::now(),
        }
    }

    pub fn failed(target: Target, error: &ProbeError, response_time: Duration) -> Self {
        Self {
            target,
            status_code: None,
            response_time,
            available: false,
            error: Some(error.to_string()),
            observed_at: Utc::now(),
        }
    }
}

/// One batch as submitted by the caller.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub targets: Vec<Target>,
    /// Per-request timeout
    pub timeout: Duration,
    pub max_workers: usize,
    /// Deadline for the whole batch, measured from dispatch start
    pub overall_deadline: Option<Duration>,
}

impl BatchRequest {
    pub fn new(targets: Vec<Target>, timeout: Duration, max_workers: usize) -> Self {
        Self {
            targets,
            timeout,
            max_workers,
            overall_deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline = Some(deadline);
        self
    }

    pub fn effective_workers(&self) -> usize {
        self.max_workers.min(self.targets.len())
    }
}

/// Outcomes of a batch, one per submitted target, in no particular order.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub outcomes: Vec<ProbeOutcome>,
    pub total_elapsed: Duration,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn available_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.available).count()
    }
}
