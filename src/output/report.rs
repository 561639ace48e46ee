use crate::error::Result;
use crate::job::ResultRow;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const REPORT_FILE_NAME: &str = "ead-fetch-report.csv";

/// Headerless CSV of `[URL, Identifier, HTTP-Status, ErrorDetail]` rows.
pub struct CsvReport {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvReport {
    pub fn create(dir: &Path) -> Result<Self> {
        let path = dir.join(REPORT_FILE_NAME);
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        Ok(Self { path, writer })
    }

    pub fn write(&mut self, row: &ResultRow) -> Result<()> {
        self.writer.write_record(row.to_record())?;
        Ok(())
    }

    pub fn close(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

/// Writes every row in the given order and returns the report path.
pub fn write_report(dir: &Path, rows: &[ResultRow]) -> Result<PathBuf> {
    let mut report = CsvReport::create(dir)?;
    for row in rows {
        report.write(row)?;
    }
    report.close()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(url: &str, identifier: &str, status: &str, detail: &str) -> ResultRow {
        ResultRow {
            url: url.to_string(),
            identifier: identifier.to_string(),
            status: status.to_string(),
            error_detail: detail.to_string(),
        }
    }

    #[test]
    fn writes_rows_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            row("http://h/index.php?id=1", "VF00001", "200 OK", ""),
            row("http://h/index.php?id=2", "VF00002", "", "Request Error: connection refused, retry later"),
        ];

        let path = write_report(dir.path(), &rows).unwrap();
        assert_eq!(path, dir.path().join(REPORT_FILE_NAME));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "http://h/index.php?id=1,VF00001,200 OK,");
        assert_eq!(
            lines[1],
            "http://h/index.php?id=2,VF00002,,\"Request Error: connection refused, retry later\""
        );
    }

    #[test]
    fn empty_run_writes_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(dir.path(), &[]).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_report(&missing, &[]).is_err());
    }
}
