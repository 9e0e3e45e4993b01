//! Error types for probing and batch configuration.
//!
//! Probe failures never escape a batch: each one is folded into the
//! `ProbeOutcome` of the target that produced it. Only a `ConfigError`
//! is returned to the caller, and always before any dispatch starts.

use std::fmt;
use std::time::Duration;

/// Why a single probe failed to obtain a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The target cannot be turned into an HTTP request
    MalformedTarget(String),
    /// No response before the per-request timeout
    Timeout(Duration),
    /// Refused, reset, DNS failure or any other transport error
    ConnectionFailure(String),
    /// Batch cancellation fired before this probe completed
    Cancelled,
    /// The worker holding this target died before reporting it
    WorkerLost,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::MalformedTarget(msg) => write!(f, "malformed target: {}", msg),
            ProbeError::Timeout(after) => {
                write!(f, "request failed: timed out after {}ms", after.as_millis())
            }
            ProbeError::ConnectionFailure(msg) => write!(f, "request failed: {}", msg),
            ProbeError::Cancelled => write!(f, "request failed: batch cancelled"),
            ProbeError::WorkerLost => write!(f, "probe aborted: worker terminated unexpectedly"),
        }
    }
}

impl std::error::Error for ProbeError {}

/// Invalid batch configuration, reported before any target is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroWorkers,
    ZeroTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroWorkers => write!(f, "max_workers must be at least 1"),
            ConfigError::ZeroTimeout => write!(f, "timeout must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_errors_render_readable_messages() {
        let timeout = ProbeError::Timeout(Duration::from_millis(250));
        assert_eq!(timeout.to_string(), "request failed: timed out after 250ms");

        let cancelled = ProbeError::Cancelled;
        assert!(cancelled.to_string().contains("cancelled"));

        let malformed = ProbeError::MalformedTarget("relative URL without a base".into());
        assert!(malformed.to_string().starts_with("malformed target"));
    }

    #[test]
    fn config_errors_name_the_field() {
        assert!(ConfigError::ZeroWorkers.to_string().contains("max_workers"));
        assert!(ConfigError::ZeroTimeout.to_string().contains("timeout"));
    }
}
