pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod naming;
pub mod output;
pub mod progress;
pub mod queue;
pub mod rate_gate;
pub mod retry;
pub mod worker;

pub use catalog::CatalogRecord;
pub use engine::{Aggregator, EngineSettings, FetchEngine};
pub use error::{Error, Result};
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use job::{build_url, FetchJob, ResultRow};
pub use metrics::collector::MetricsCollector;
pub use metrics::snapshot::MetricsSnapshot;
pub use naming::{generate_filename, NameField, NameFormat};
