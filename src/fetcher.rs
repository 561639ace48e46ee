use crate::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Body text Archon returns (with a 200) for an unknown collection ID.
pub const NOT_FOUND_SENTINEL: &str = "Could not load Collection: Collection ID";

/// Why a single attempt produced no response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(describe(&e))
        }
    }
}

/// reqwest's top-level message hides the cause (refused, DNS, ...).
fn describe(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// A complete response: status plus the fully read body.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl FetchedDocument {
    /// Status line as reported in the fetch report, e.g. `200 OK`.
    pub fn status_line(&self) -> String {
        self.status.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        let sentinel = NOT_FOUND_SENTINEL.as_bytes();
        self.body.windows(sentinel.len()).any(|window| window == sentinel)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one GET and reads the whole body.
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedDocument, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Verifies the host answers at all before a run is started.
    pub async fn check_host(&self, host: &str) -> Result<()> {
        let res = self.client.get(host).send().await?;
        log::debug!("Host {} answered with {}", host, res.status());
        Ok(())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedDocument, FetchError> {
        log::debug!("Requesting: {}", url);

        let res = self.client.get(url).send().await?;
        let status = res.status();
        let body = res.bytes().await?;
        log::debug!("{} returned {} ({} bytes)", url, status, body.len());

        Ok(FetchedDocument {
            status,
            body: body.to_vec(),
        })
    }
}
