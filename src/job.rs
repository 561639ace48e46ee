use crate::catalog::CatalogRecord;

/// Query template appended to the host for every EAD request.
pub const EAD_ENDPOINT: &str = "/index.php?p=collections/ead&templateset=ead&disabletheme=1&id=";

/// Builds the EAD export URL for a collection ID,
/// e.g. `https://archives.example.edu/index.php?p=collections/ead&templateset=ead&disabletheme=1&id=2`.
pub fn build_url(host: &str, id: i64) -> String {
    format!("{}{}{}", host, EAD_ENDPOINT, id)
}

/// One pending request for a single catalog record's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub record: CatalogRecord,
    pub url: String,
}

impl FetchJob {
    pub fn new(host: &str, record: CatalogRecord) -> Self {
        let url = build_url(host, record.id);
        Self { record, url }
    }

    pub fn id(&self) -> i64 {
        self.record.id
    }
}

/// Terminal outcome of a job; one line of the fetch report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub url: String,
    pub identifier: String,
    /// HTTP status line, empty when no response was received.
    pub status: String,
    /// Empty on success.
    pub error_detail: String,
}

impl ResultRow {
    pub fn success(job: &FetchJob, status: impl Into<String>) -> Self {
        Self::failure(job, status, String::new())
    }

    pub fn failure(job: &FetchJob, status: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            url: job.url.clone(),
            identifier: job.record.identifier.clone(),
            status: status.into(),
            error_detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_detail.is_empty()
    }

    pub fn to_record(&self) -> [&str; 4] {
        [&self.url, &self.identifier, &self.status, &self.error_detail]
    }
}
