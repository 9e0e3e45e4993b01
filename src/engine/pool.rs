use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::queue::JobQueue;
use crate::metrics;
use crate::model::ProbeOutcome;
use crate::prober::Probe;

/// Shared inputs of every worker in one batch.
pub struct WorkerContext<P> {
    pub prober: Arc<P>,
    pub queue: Arc<JobQueue>,
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl<P> Clone for WorkerContext<P> {
    fn clone(&self) -> Self {
        Self {
            prober: self.prober.clone(),
            queue: self.queue.clone(),
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}

/// Spawn `count` workers. Each holds a clone of `results`; the channel
/// closes once the last worker exits.
pub fn spawn_workers<P: Probe>(
    count: usize,
    ctx: WorkerContext<P>,
    results: mpsc::Sender<ProbeOutcome>,
) -> JoinSet<()> {
    let mut pool = JoinSet::new();
    for id in 0..count {
        pool.spawn(worker(id, ctx.clone(), results.clone()));
    }
    pool
}

async fn worker<P: Probe>(id: usize, ctx: WorkerContext<P>, results: mpsc::Sender<ProbeOutcome>) {
    let _active = ActiveWorker::enter();
    let mut probed = 0usize;

    loop {
        if ctx.cancel.is_cancelled() {
            tracing::debug!(worker = id, probed, "worker stopping: batch cancelled");
            break;
        }
        let Some(target) = ctx.queue.next() else {
            tracing::debug!(worker = id, probed, "worker stopping: queue exhausted");
            break;
        };

        let outcome = ctx.prober.probe(&target, ctx.timeout, &ctx.cancel).await;
        probed += 1;
        if results.send(outcome).await.is_err() {
            tracing::warn!(worker = id, "result collector went away");
            break;
        }
    }
}

// keeps the active worker gauge honest even if a probe panics
struct ActiveWorker;

impl ActiveWorker {
    fn enter() -> Self {
        metrics::ACTIVE_WORKERS.inc();
        ActiveWorker
    }
}

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        metrics::ACTIVE_WORKERS.dec();
    }
}
