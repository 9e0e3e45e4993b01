use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::model::ProbeOutcome;

pub mod http;

pub use http::HttpProber;

/// One reachability check against one target.
///
/// Implementations must always produce an outcome: failures are recorded in
/// the outcome, never returned. `timeout` bounds the wait for a response and
/// `cancel` lets the batch abandon the wait early.
pub trait Probe: Send + Sync + 'static {
    fn probe(
        &self,
        target: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ProbeOutcome> + Send;
}
