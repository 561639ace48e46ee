//! Unbounded multi-consumer FIFO of pending fetch jobs.
//!
//! The producer and workers (for retries) push; workers pull one job at a
//! time. Each queued item is handed to exactly one consumer. The queue stays
//! open until the engine has collected every result, since a retry can still
//! write to it up to that point.

use crate::error::{Error, Result};
use crate::job::FetchJob;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

/// A job plus the number of the attempt it is queued for.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job: Arc<FetchJob>,
    pub attempt: u32,
}

impl QueuedJob {
    pub fn new(job: FetchJob) -> Self {
        Self {
            job: Arc::new(job),
            attempt: 1,
        }
    }

    /// The same job, queued for its next attempt.
    pub fn next_attempt(self) -> Self {
        Self {
            job: self.job,
            attempt: self.attempt + 1,
        }
    }
}

#[derive(Clone)]
pub struct WorkQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    closed: Arc<watch::Sender<bool>>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            closed: Arc::new(closed),
        }
    }

    pub fn push(&self, job: QueuedJob) -> Result<()> {
        if self.is_closed() {
            return Err(Error::QueueClosed);
        }
        self.tx.send(job).map_err(|_| Error::QueueClosed)
    }

    /// Pushes `job` back after `delay` without blocking the caller.
    pub fn requeue_after(&self, job: QueuedJob, delay: Duration) {
        if delay.is_zero() {
            if let Err(e) = self.push(job) {
                log::debug!("Dropping retry: {}", e);
            }
            return;
        }

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = queue.push(job) {
                log::debug!("Dropping delayed retry: {}", e);
            }
        });
    }

    /// Waits for the next job. Returns `None` once the queue is closed.
    pub async fn next(&self) -> Option<QueuedJob> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return None;
        }

        tokio::select! {
            biased;
            _ = closed.changed() => None,
            job = async { self.rx.lock().await.recv().await } => job,
        }
    }

    /// Stops all consumers. Jobs still queued are discarded.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}
