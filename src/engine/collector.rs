use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::ProbeError;
use crate::model::{ProbeOutcome, Target};

/// Receiving end of a batch's outcomes.
///
/// Completion is signalled by the channel closing, which happens when the
/// last worker drops its sender.
pub struct ResultCollector {
    rx: mpsc::Receiver<ProbeOutcome>,
    expected: usize,
}

impl ResultCollector {
    /// Sized to the batch so a worker never waits on the collector.
    pub fn channel(expected: usize) -> (mpsc::Sender<ProbeOutcome>, Self) {
        let (tx, rx) = mpsc::channel(expected.max(1));
        (tx, Self { rx, expected })
    }

    pub async fn collect(mut self) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(self.expected);
        while let Some(outcome) = self.rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// Add a failure outcome for every submitted target that has none.
///
/// Duplicates are matched by count: three submissions of the same URL need
/// three outcomes carrying that URL. Returns how many were synthesized.
pub fn reconcile(
    targets: &[Target],
    outcomes: &mut Vec<ProbeOutcome>,
    error: &ProbeError,
) -> usize {
    let mut reported: HashMap<&str, usize> = HashMap::new();
    for outcome in outcomes.iter() {
        *reported.entry(outcome.target.as_str()).or_default() += 1;
    }

    let mut missing = Vec::new();
    for target in targets {
        match reported.get_mut(target.as_str()) {
            Some(n) if *n > 0 => *n -= 1,
            _ => missing.push(ProbeOutcome::failed(target.clone(), error, Duration::ZERO)),
        }
    }

    let added = missing.len();
    outcomes.extend(missing);
    added
}
