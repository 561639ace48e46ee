use crate::catalog::CatalogRecord;
use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::job::{FetchJob, ResultRow};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::output::DocumentStore;
use crate::queue::{QueuedJob, WorkQueue};
use crate::rate_gate::RateGate;
use crate::retry::RetryPolicy;
use crate::worker::{Worker, WorkerMessage};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub host: String,
    pub workers: usize,
    pub timeout: Duration,
    pub rate_limit: u32,
    pub retry: RetryPolicy,
}

impl EngineSettings {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            host: config.host.clone(),
            workers: config.workers,
            timeout: config.timeout(),
            rate_limit: config.rate_limit,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Receives exactly `expected` rows, reporting "k of N" progress.
pub struct Aggregator {
    expected: usize,
    progress: Option<ProgressBar>,
}

impl Aggregator {
    pub fn new(expected: usize, progress: Option<ProgressBar>) -> Self {
        Self { expected, progress }
    }

    /// Rows come back in arrival order. A fatal worker error ends collection early.
    pub async fn collect(
        &self,
        results: &mut mpsc::UnboundedReceiver<WorkerMessage>,
    ) -> Result<Vec<ResultRow>> {
        let mut rows = Vec::with_capacity(self.expected);

        while rows.len() < self.expected {
            match results.recv().await {
                Some(Ok(row)) => rows.push(row),
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(Error::Internal(format!(
                        "all workers exited after {} of {} results",
                        rows.len(),
                        self.expected
                    )));
                }
            }

            match &self.progress {
                Some(pb) => pb.set_position(rows.len() as u64),
                None => log::info!("Fetching: {} of {} collections.", rows.len(), self.expected),
            }
        }

        Ok(rows)
    }
}

pub struct FetchEngine {
    settings: EngineSettings,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<DocumentStore>,
    metrics: Arc<MetricsCollector>,
}

impl FetchEngine {
    pub fn new(
        settings: EngineSettings,
        fetcher: Arc<dyn Fetcher>,
        store: DocumentStore,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            store: Arc::new(store),
            metrics: metrics.unwrap_or_else(|| Arc::new(MetricsCollector::new())),
        }
    }

    /// Fetches every record and returns one row per record.
    pub async fn run(
        &self,
        records: Vec<CatalogRecord>,
        progress: Option<ProgressBar>,
    ) -> Result<Vec<ResultRow>> {
        let total = records.len();
        if total == 0 {
            log::info!("No collections to fetch.");
            return Ok(Vec::new());
        }

        let queue = WorkQueue::new();
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();
        let gate = Arc::new(RateGate::new(self.settings.rate_limit));

        // Producer
        let producer_queue = queue.clone();
        let producer_metrics = self.metrics.clone();
        let host = self.settings.host.clone();
        let producer = tokio::spawn(async move {
            for record in records {
                let job = QueuedJob::new(FetchJob::new(&host, record));
                if let Err(e) = producer_queue.push(job) {
                    log::error!("Producer stopped early: {}", e);
                    break;
                }
                producer_metrics.increment_jobs_queued();
            }
            log::debug!("Producer finished.");
        });

        // Workers
        let mut workers = Vec::with_capacity(self.settings.workers);
        for id in 1..=self.settings.workers {
            let worker = Worker {
                id,
                fetcher: self.fetcher.clone(),
                queue: queue.clone(),
                gate: gate.clone(),
                store: self.store.clone(),
                results: results_tx.clone(),
                metrics: self.metrics.clone(),
                timeout: self.settings.timeout,
                retry: self.settings.retry,
            };
            workers.push(tokio::spawn(worker.run()));
        }
        drop(results_tx);

        log::info!(
            "Fetching {} collections with {} workers at {} requests/second",
            total,
            self.settings.workers,
            self.settings.rate_limit
        );

        let collected = Aggregator::new(total, progress).collect(&mut results_rx).await;

        queue.close();
        drop(results_rx);
        gate.stop();

        if collected.is_err() {
            for worker in &workers {
                worker.abort();
            }
            producer.abort();
            return collected;
        }

        for joined in futures::future::join_all(workers).await {
            if let Err(e) = joined {
                log::error!("Worker task failed: {}", e);
            }
        }
        if let Err(e) = producer.await {
            log::error!("Producer task failed: {}", e);
        }

        log::info!("Fetch finished.");
        collected
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Publishes a metrics snapshot every 500ms until the receiver is dropped.
    pub fn watch_metrics(&self) -> watch::Receiver<MetricsSnapshot> {
        let (tx, rx) = watch::channel(self.metrics.snapshot());
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(500));
            loop {
                interval.tick().await;
                if tx.send(metrics.snapshot()).is_err() {
                    break;
                }
            }
        });
        rx
    }
}
