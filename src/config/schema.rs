use crate::naming::NameFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FetchConfig {
    /// Catalog of collections to fetch (.csv or .json)
    #[validate(length(min = 1))]
    pub input: String,

    /// Base URL of the Archon site, e.g. https://archives.example.edu
    #[validate(custom = "validate_host")]
    pub host: String,

    #[validate(range(min = 1))]
    pub workers: usize,

    /// Directory receiving the XML files and the report
    #[validate(length(min = 1))]
    pub output: String,

    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Requests started per second across all workers
    #[validate(range(min = 1, max = 1000))]
    pub rate_limit: u32,

    /// Comma-separated fields used to name files: CollectionIdentifier, Title
    #[validate(custom = "validate_name_format")]
    pub name_format: String,

    /// Only fetch the first N collections; 0 fetches all
    pub test_limit: usize,

    #[validate]
    pub retry: RetryConfig,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            input: "collections-table.csv".to_string(),
            host: "http://127.0.0.1".to_string(),
            workers: 2,
            output: "./ead_output".to_string(),
            timeout_secs: 30,
            rate_limit: 4,
            name_format: String::new(),
            test_limit: 0,
            retry: RetryConfig::default(),
            user_agent: concat!("ead-fetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output)
    }

    pub fn name_format(&self) -> crate::Result<NameFormat> {
        NameFormat::parse(&self.name_format)
    }

    pub fn test_limit(&self) -> Option<usize> {
        (self.test_limit > 0).then_some(self.test_limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries per collection after a timed-out attempt
    #[validate(range(max = 100))]
    pub max_retries: u32,

    pub initial_backoff_ms: u64,

    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
        }
    }
}

fn validate_host(host: &str) -> Result<(), ValidationError> {
    match url::Url::parse(host) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ValidationError::new("host must be an http(s) URL")),
    }
}

fn validate_name_format(format: &str) -> Result<(), ValidationError> {
    NameFormat::parse(format)
        .map(|_| ())
        .map_err(|_| ValidationError::new("name_format accepts CollectionIdentifier and Title"))
}
