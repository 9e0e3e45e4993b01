//! Concurrent URL availability checking.
//!
//! The core is [`engine::run_batch`]: a bounded pool of workers drains a
//! shared queue of URLs, probes each one once through a [`prober::Probe`],
//! and returns exactly one [`model::ProbeOutcome`] per submitted URL, even
//! when the batch deadline cuts dispatch short. [`api`] wraps it in a small
//! HTTP service with metrics and a dashboard.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod model;
pub mod prober;
pub mod util;

pub use engine::{run_batch, run_batch_with_cancel};
pub use error::{ConfigError, ProbeError};
pub use model::{BatchRequest, BatchResult, ProbeOutcome, Target};
pub use prober::{HttpProber, Probe};
