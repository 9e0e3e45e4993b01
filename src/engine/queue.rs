use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::Target;

/// Ordered supply of targets shared by every worker of a batch.
///
/// The lock is only taken to pop or drain, never across an await.
#[derive(Debug)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Target>>,
}

impl JobQueue {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            jobs: Mutex::new(targets.into()),
        }
    }

    /// Next target in submission order, or `None` once exhausted.
    pub fn next(&self) -> Option<Target> {
        self.lock().pop_front()
    }

    /// Take everything that was never handed to a worker.
    pub fn drain(&self) -> Vec<Target> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // a worker panicking mid-pop cannot leave the deque inconsistent
    fn lock(&self) -> MutexGuard<'_, VecDeque<Target>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn yields_in_submission_order() {
        let queue = JobQueue::new(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(queue.next().as_deref(), Some("a"));
        assert_eq!(queue.next().as_deref(), Some("b"));
        assert_eq!(queue.next().as_deref(), Some("a"));
        assert_eq!(queue.next(), None);
        assert_eq!(queue.next(), None);
    }

    #[test]
    fn drain_returns_undispatched_targets() {
        let queue = JobQueue::new(vec!["a".into(), "b".into(), "c".into()]);
        queue.next();
        assert_eq!(queue.drain(), vec!["b".to_string(), "c".to_string()]);
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_consumers_see_each_target_once() {
        let targets: Vec<Target> = (0..1000).map(|i| format!("http://host/{i}")).collect();
        let queue = Arc::new(JobQueue::new(targets.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(t) = queue.next() {
                        taken.push(t);
                    }
                    taken
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut total = 0;
        for h in handles {
            for t in h.join().unwrap() {
                total += 1;
                seen.insert(t);
            }
        }
        assert_eq!(total, targets.len());
        assert_eq!(seen.len(), targets.len());
    }
}
