//! Catalog ingestion: the list of Archon collections to fetch, read from a
//! CSV export of the collections table or a JSON array.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "ID", alias = "id", alias = "Id")]
    pub id: i64,

    #[serde(
        default,
        rename = "CollectionIdentifier",
        alias = "collectionidentifier",
        alias = "Identifier",
        alias = "identifier"
    )]
    pub identifier: String,

    #[serde(default, rename = "Title", alias = "title")]
    pub title: String,
}

impl CatalogRecord {
    pub fn new(id: i64, identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            identifier: identifier.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Csv,
    Json,
}

impl CatalogFormat {
    pub fn detect(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(CatalogFormat::Csv),
            Some("json") => Ok(CatalogFormat::Json),
            _ => Err(Error::Catalog(format!(
                "cannot detect file type of {}; use a .csv or .json extension",
                path.display()
            ))),
        }
    }
}

/// Column positions of the recognised fields in a CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMap {
    pub id: usize,
    pub identifier: Option<usize>,
    pub title: Option<usize>,
}

fn normalize_header(cell: &str) -> &str {
    // Strips BOMs and stray punctuation around the column name.
    cell.trim_matches(|c: char| !c.is_alphabetic())
}

fn find_column<'a>(header: impl IntoIterator<Item = &'a str> + Clone, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        header
            .clone()
            .into_iter()
            .position(|cell| normalize_header(cell).eq_ignore_ascii_case(name))
    })
}

/// Maps header cells to record fields by case-insensitive name.
pub fn map_header<'a>(header: impl IntoIterator<Item = &'a str> + Clone) -> Result<HeaderMap> {
    let id = find_column(header.clone(), &["ID"])
        .ok_or_else(|| Error::Catalog("no ID column found in CSV".to_string()))?;

    Ok(HeaderMap {
        id,
        identifier: find_column(header.clone(), &["CollectionIdentifier", "Identifier"]),
        title: find_column(header, &["Title"]),
    })
}

pub fn parse_csv(data: &[u8]) -> Result<Vec<CatalogRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let cells: Vec<&str> = headers.iter().collect();
    let columns = map_header(cells.iter().copied())?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .unwrap_or_default()
                .to_string()
        };

        let raw_id = row.get(columns.id).unwrap_or_default().trim();
        let id = raw_id.parse::<i64>().map_err(|e| {
            Error::Catalog(format!("line {}: invalid ID '{}': {}", line, raw_id, e))
        })?;

        records.push(CatalogRecord {
            id,
            identifier: cell(columns.identifier),
            title: cell(columns.title),
        });
    }

    Ok(records)
}

pub fn parse_json(data: &[u8]) -> Result<Vec<CatalogRecord>> {
    Ok(serde_json::from_slice(data)?)
}

pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogRecord>> {
    let path = path.as_ref();
    let format = CatalogFormat::detect(path)?;
    let data = fs::read(path)
        .map_err(|e| Error::Catalog(format!("{}: {}", path.display(), e)))?;

    let records = match format {
        CatalogFormat::Csv => parse_csv(&data)?,
        CatalogFormat::Json => parse_json(&data)?,
    };
    log::info!("Loaded {} collections from {}", records.len(), path.display());
    Ok(records)
}

/// Keeps only the first `limit` records; `None` or `0` keeps everything.
pub fn limit_records(mut records: Vec<CatalogRecord>, limit: Option<usize>) -> Vec<CatalogRecord> {
    if let Some(limit) = limit.filter(|l| *l > 0) {
        records.truncate(limit);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn maps_header_columns() {
        let full = ["ID", "Enabled", "RepositoryID", "ClassificationID", "CollectionIdentifier", "Title", "SortTitle"];
        assert_eq!(
            map_header(full.iter().copied()).unwrap(),
            HeaderMap { id: 0, identifier: Some(4), title: Some(5) }
        );

        let short = ["ID", "CollectionIdentifier", "Title", "SortTitle"];
        assert_eq!(
            map_header(short.iter().copied()).unwrap(),
            HeaderMap { id: 0, identifier: Some(1), title: Some(2) }
        );

        let lower = ["id", "collectionidentifier", "title"];
        assert_eq!(
            map_header(lower.iter().copied()).unwrap(),
            HeaderMap { id: 0, identifier: Some(1), title: Some(2) }
        );
    }

    #[test]
    fn header_without_id_is_rejected() {
        let err = map_header(["CollectionIdentifier", "Title"].iter().copied()).unwrap_err();
        assert_eq!(err.to_string(), "catalog error: no ID column found in CSV");
    }

    #[test]
    fn header_tolerates_byte_order_mark() {
        let header = ["\u{feff}ID", "Title"];
        let map = map_header(header.iter().copied()).unwrap();
        assert_eq!(map.id, 0);
        assert_eq!(map.identifier, None);
        assert_eq!(map.title, Some(1));
    }

    #[test]
    fn parses_csv_rows() {
        let data = b"ID,Enabled,CollectionIdentifier,Title\n1,1,VF00001,\"Smith, John papers\"\n 2 ,1,VF00002,Letters\n";
        let records = parse_csv(data).unwrap();
        assert_eq!(
            records,
            vec![
                CatalogRecord::new(1, "VF00001", "Smith, John papers"),
                CatalogRecord::new(2, "VF00002", "Letters"),
            ]
        );
    }

    #[test]
    fn csv_with_only_ids_yields_empty_fields() {
        let records = parse_csv(b"ID\n10\n11\n").unwrap();
        assert_eq!(records, vec![CatalogRecord::new(10, "", ""), CatalogRecord::new(11, "", "")]);
    }

    #[test]
    fn csv_with_bad_id_reports_line() {
        let err = parse_csv(b"ID,Title\n1,A\nabc,B\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "{}", msg);
        assert!(msg.contains("abc"), "{}", msg);
    }

    #[test]
    fn parses_json_arrays() {
        let data = br#"[
            {"ID": 1, "CollectionIdentifier": "VF00001", "Title": "Some Title"},
            {"id": 2, "title": "Untitled"}
        ]"#;
        let records = parse_json(data).unwrap();
        assert_eq!(
            records,
            vec![CatalogRecord::new(1, "VF00001", "Some Title"), CatalogRecord::new(2, "", "Untitled")]
        );
    }

    #[test]
    fn loads_records_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("collections-table.CSV");
        let mut file = fs::File::create(&csv_path).unwrap();
        writeln!(file, "ID,Title").unwrap();
        writeln!(file, "3,Diaries").unwrap();
        assert_eq!(load_records(&csv_path).unwrap(), vec![CatalogRecord::new(3, "", "Diaries")]);

        let json_path = dir.path().join("collections.json");
        fs::write(&json_path, r#"[{"ID": 4}]"#).unwrap();
        assert_eq!(load_records(&json_path).unwrap(), vec![CatalogRecord::new(4, "", "")]);

        let txt_path = dir.path().join("collections.txt");
        fs::write(&txt_path, "ID\n1\n").unwrap();
        assert!(matches!(load_records(&txt_path), Err(Error::Catalog(_))));
    }

    #[test]
    fn limits_records_for_test_runs() {
        let records: Vec<_> = (1..=5).map(|id| CatalogRecord::new(id, "", "")).collect();
        assert_eq!(limit_records(records.clone(), Some(2)).len(), 2);
        assert_eq!(limit_records(records.clone(), Some(0)).len(), 5);
        assert_eq!(limit_records(records.clone(), Some(50)).len(), 5);
        assert_eq!(limit_records(records, None).len(), 5);
    }
}
