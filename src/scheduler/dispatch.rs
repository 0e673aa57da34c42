//! In-memory FIFO between the claiming loop and the workers.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::job::JobId;

#[derive(Debug, Default)]
struct DispatchState {
    jobs: VecDeque<JobId>,
    shutdown: bool,
}

/// Claimed job IDs waiting for a free worker.
///
/// Waiters register with the [`Notify`] before they look at the queue, so a
/// push or shutdown that lands between the check and the wait is never lost.
#[derive(Debug, Default)]
pub struct DispatchQueue {
    state: Mutex<DispatchState>,
    available: Notify,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `id` and wakes one waiting worker. Hands the ID back if the
    /// queue has already been shut down.
    pub fn push(&self, id: JobId) -> Result<(), JobId> {
        {
            let mut state = self.lock();
            if state.shutdown {
                return Err(id);
            }
            state.jobs.push_back(id);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Waits for the next job. Returns `None` once shutdown was requested,
    /// even if jobs are still queued; those are collected with [`drain`].
    ///
    /// [`drain`]: DispatchQueue::drain
    pub async fn pop(&self) -> Option<JobId> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.shutdown {
                    return None;
                }
                if let Some(id) = state.jobs.pop_front() {
                    return Some(id);
                }
            }

            notified.await;
        }
    }

    /// Flags shutdown and wakes every waiter.
    pub fn shutdown(&self) {
        self.lock().shutdown = true;
        self.available.notify_waiters();
    }

    /// Removes and returns every job never handed to a worker.
    pub fn drain(&self) -> Vec<JobId> {
        self.lock().jobs.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panicking holder cannot leave the queue half-updated.
    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn id(n: u32) -> JobId {
        JobId::parse(&format!("job1_100_{n}")).unwrap()
    }

    #[tokio::test]
    async fn pop_is_fifo() {
        let queue = DispatchQueue::new();
        for n in 0..3 {
            queue.push(id(n)).unwrap();
        }
        assert_eq!(queue.len(), 3);
        for n in 0..3 {
            assert_eq!(queue.pop().await, Some(id(n)));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn waiting_worker_is_woken_by_push() {
        let queue = Arc::new(DispatchQueue::new());
        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.pop().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(id(7)).unwrap();

        let popped = timeout(Duration::from_secs(2), waiter).await.unwrap().unwrap();
        assert_eq!(popped, Some(id(7)));
    }

    #[tokio::test]
    async fn shutdown_wakes_every_waiter() {
        let queue = Arc::new(DispatchQueue::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.pop().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.shutdown();

        for waiter in waiters {
            let popped = timeout(Duration::from_secs(2), waiter).await.unwrap().unwrap();
            assert_eq!(popped, None);
        }
    }

    #[tokio::test]
    async fn push_after_shutdown_returns_the_id() {
        let queue = DispatchQueue::new();
        queue.push(id(1)).unwrap();
        queue.shutdown();

        assert_eq!(queue.push(id(2)), Err(id(2)));
        assert_eq!(queue.pop().await, None);
        assert_eq!(queue.drain(), vec![id(1)]);
    }

    #[tokio::test]
    async fn many_pushes_reach_many_workers() {
        let queue = Arc::new(DispatchQueue::new());
        let workers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move {
                    let mut got = Vec::new();
                    while let Some(id) = queue.pop().await {
                        got.push(id);
                    }
                    got
                })
            })
            .collect();

        for n in 0..30 {
            queue.push(id(n)).unwrap();
        }
        while !queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        queue.shutdown();

        let mut all = Vec::new();
        for worker in workers {
            all.extend(worker.await.unwrap());
        }
        all.sort();
        let mut expected: Vec<_> = (0..30).map(id).collect();
        expected.sort();
        assert_eq!(all, expected);
    }
}
