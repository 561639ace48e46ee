//! A single fetch worker.
//!
//! Per job: `Queued → Attempting → {Retry → Queued | Success | Failure}`.
//! Only terminal states produce a [`ResultRow`]; a retried attempt produces
//! nothing but a re-enqueue, so the row count always equals the job count.

use crate::error::Result;
use crate::fetcher::{FetchError, FetchedDocument, Fetcher};
use crate::job::{FetchJob, ResultRow};
use crate::metrics::MetricsCollector;
use crate::output::DocumentStore;
use crate::queue::{QueuedJob, WorkQueue};
use crate::rate_gate::RateGate;
use crate::retry::{RetryDecision, RetryPolicy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// What the aggregator receives: a terminal row, or a fatal local error.
pub type WorkerMessage = Result<ResultRow>;

pub struct Worker {
    pub id: usize,
    pub fetcher: Arc<dyn Fetcher>,
    pub queue: WorkQueue,
    pub gate: Arc<RateGate>,
    pub store: Arc<DocumentStore>,
    pub results: mpsc::UnboundedSender<WorkerMessage>,
    pub metrics: Arc<MetricsCollector>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Worker {
    /// Pulls jobs until the queue is closed. A document write failure is sent
    /// to the aggregator and ends this worker.
    pub async fn run(self) {
        log::debug!("Worker {} started", self.id);

        while let Some(queued) = self.queue.next().await {
            if !self.gate.acquire().await {
                log::debug!("Worker {}: rate gate stopped, dropping collection {}", self.id, queued.job.id());
                break;
            }

            self.metrics.increment_active_workers();
            let outcome = self.process(queued).await;
            self.metrics.decrement_active_workers();

            let message = match outcome {
                Ok(Some(row)) => Ok(row),
                Ok(None) => continue,
                Err(e) => {
                    log::error!("Worker {}: {}", self.id, e);
                    Err(e)
                }
            };
            let fatal = message.is_err();

            if self.results.send(message).is_err() {
                log::debug!("Worker {}: result receiver gone", self.id);
                break;
            }
            if fatal {
                break;
            }
        }

        log::debug!("Worker {} finished", self.id);
    }

    /// Runs one attempt. `Ok(None)` means the job was re-enqueued.
    pub async fn process(&self, queued: QueuedJob) -> Result<Option<ResultRow>> {
        let job = queued.job.clone();
        let started = Instant::now();

        // Dropping the fetch future cancels the request and any pending body read.
        let attempt = match tokio::time::timeout(self.timeout, self.fetcher.fetch(&job.url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };
        self.metrics.record_attempt(started.elapsed());

        match attempt {
            Err(FetchError::Timeout) => Ok(self.on_timeout(queued)),
            Err(FetchError::Transport(detail)) => {
                log::warn!("Collection {} failed: {}", job.id(), detail);
                self.metrics.record_failure();
                Ok(Some(ResultRow::failure(&job, "", format!("Request Error: {}", detail))))
            }
            Ok(document) => self.on_response(&job, document).await.map(Some),
        }
    }

    fn on_timeout(&self, queued: QueuedJob) -> Option<ResultRow> {
        self.metrics.record_timeout();
        let attempt = queued.attempt;

        match self.retry.decide(attempt) {
            RetryDecision::RetryAfter(delay) => {
                log::warn!(
                    "Collection {} timed out (attempt {}), requeueing in {:?}",
                    queued.job.id(),
                    attempt,
                    delay
                );
                self.metrics.record_retry();
                self.queue.requeue_after(queued.next_attempt(), delay);
                None
            }
            RetryDecision::GiveUp => {
                log::warn!("Collection {} timed out after {} attempts", queued.job.id(), attempt);
                self.metrics.record_failure();
                Some(ResultRow::failure(
                    &queued.job,
                    "",
                    format!("Request Error: timed out after {} attempts", attempt),
                ))
            }
        }
    }

    async fn on_response(&self, job: &FetchJob, document: FetchedDocument) -> Result<ResultRow> {
        let status = document.status_line();
        self.metrics.record_bytes(document.body.len());

        if document.is_not_found() {
            log::warn!("Collection {} not found on server", job.id());
            self.metrics.record_failure();
            let body = String::from_utf8_lossy(&document.body);
            return Ok(ResultRow::failure(job, status, format!("Request Error: {}", body.trim())));
        }

        if !document.status.is_success() {
            log::warn!("Collection {} returned {}", job.id(), status);
            self.metrics.record_failure();
            let detail = format!("HTTP error: {}", status);
            return Ok(ResultRow::failure(job, status, detail));
        }

        let path = self.store.write(job, &document.body).await?;
        log::debug!("Saved collection {} to {}", job.id(), path.display());
        self.metrics.record_success();
        Ok(ResultRow::success(job, status))
    }
}
