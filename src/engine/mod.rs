//! Batch dispatch engine.
//!
//! A batch moves through `Idle -> Dispatching -> Draining -> Complete`:
//! workers pull targets from a shared [`JobQueue`] until it is empty or the
//! batch is cancelled, outcomes flow into a [`ResultCollector`], and the
//! coordinator returns once every worker has exited. Targets still queued
//! when cancellation fires are reported as cancelled, so the result always
//! holds one outcome per submitted target.

use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, ProbeError};
use crate::model::{BatchRequest, BatchResult, ProbeOutcome};
use crate::prober::Probe;

pub mod collector;
pub mod pool;
pub mod queue;

pub use collector::ResultCollector;
pub use queue::JobQueue;

use pool::WorkerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Dispatching,
    Draining,
    Complete,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchState::Idle => "idle",
            BatchState::Dispatching => "dispatching",
            BatchState::Draining => "draining",
            BatchState::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Probe every target in `request` with bounded concurrency.
pub async fn run_batch<P: Probe>(
    prober: Arc<P>,
    request: BatchRequest,
) -> Result<BatchResult, ConfigError> {
    run_batch_with_cancel(prober, request, CancellationToken::new()).await
}

/// Like [`run_batch`], additionally stopping dispatch when `cancel` fires.
///
/// The caller's token is never cancelled by the batch itself; the overall
/// deadline only cancels a child token.
pub async fn run_batch_with_cancel<P: Probe>(
    prober: Arc<P>,
    request: BatchRequest,
    cancel: CancellationToken,
) -> Result<BatchResult, ConfigError> {
    let start = Instant::now();
    if request.targets.is_empty() {
        return Ok(BatchResult::default());
    }
    validate(&request)?;

    let total = request.targets.len();
    let workers = request.effective_workers();
    let cancel = cancel.child_token();
    let queue = Arc::new(JobQueue::new(request.targets.clone()));
    let (results, collector) = ResultCollector::channel(total);

    let mut state = BatchState::Idle;
    transition(&mut state, BatchState::Dispatching);
    tracing::debug!(
        targets = total,
        workers,
        timeout_ms = request.timeout.as_millis() as u64,
        "batch dispatching"
    );

    let ctx = WorkerContext {
        prober,
        queue: queue.clone(),
        timeout: request.timeout,
        cancel: cancel.clone(),
    };
    let mut pool = pool::spawn_workers(workers, ctx, results);

    let collect = collector.collect();
    let deadline = tokio::time::sleep(request.overall_deadline.unwrap_or_default());
    tokio::pin!(collect, deadline);
    let has_deadline = request.overall_deadline.is_some();

    let mut outcomes = loop {
        let draining = state == BatchState::Draining;
        tokio::select! {
            outcomes = &mut collect => break outcomes,
            _ = &mut deadline, if has_deadline && !draining => {
                tracing::info!(targets = total, remaining = queue.len(), "batch deadline reached");
                cancel.cancel();
                transition(&mut state, BatchState::Draining);
            }
            _ = cancel.cancelled(), if !draining => {
                tracing::info!(targets = total, remaining = queue.len(), "batch cancelled");
                transition(&mut state, BatchState::Draining);
            }
        }
    };

    let mut lost_workers = 0;
    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            lost_workers += 1;
            tracing::error!(error = %e, "worker task failed");
        }
    }

    // never handed to a worker: cancelled, or every worker died
    let leftover_error = if cancel.is_cancelled() {
        ProbeError::Cancelled
    } else {
        ProbeError::WorkerLost
    };
    outcomes.extend(
        queue
            .drain()
            .into_iter()
            .map(|t| ProbeOutcome::failed(t, &leftover_error, std::time::Duration::ZERO)),
    );
    if lost_workers > 0 {
        let added = collector::reconcile(&request.targets, &mut outcomes, &ProbeError::WorkerLost);
        tracing::warn!(lost_workers, synthesized = added, "filled outcomes for lost workers");
    }

    transition(&mut state, BatchState::Complete);
    let result = BatchResult {
        outcomes,
        total_elapsed: start.elapsed(),
    };
    tracing::info!(
        checked = result.len(),
        available = result.available_count(),
        workers,
        elapsed_ms = result.total_elapsed.as_millis() as u64,
        "batch complete"
    );
    Ok(result)
}

fn validate(request: &BatchRequest) -> Result<(), ConfigError> {
    if request.max_workers < 1 {
        return Err(ConfigError::ZeroWorkers);
    }
    if request.timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout);
    }
    Ok(())
}

fn transition(state: &mut BatchState, next: BatchState) {
    tracing::debug!(from = %state, to = %next, "batch state");
    *state = next;
}
