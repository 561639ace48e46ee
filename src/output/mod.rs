pub mod document;
pub mod report;

pub use document::DocumentStore;
pub use report::{write_report, CsvReport, REPORT_FILE_NAME};
