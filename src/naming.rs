//! Output filename derivation for fetched EAD documents.
//!
//! Names are built from a closed set of record fields chosen at configuration
//! time. The collection ID is always the trailing component, so names stay
//! unique as long as IDs are.

use crate::catalog::CatalogRecord;
use crate::error::{Error, Result};

/// Separator placed between field values before sanitizing.
const PART_SEPARATOR: &str = "__";

const FALLBACK_PREFIX: &str = "ead";

/// A record field that may contribute to a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Identifier,
    Title,
}

impl NameField {
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("Identifier") || name.eq_ignore_ascii_case("CollectionIdentifier") {
            Ok(NameField::Identifier)
        } else if name.eq_ignore_ascii_case("Title") {
            Ok(NameField::Title)
        } else {
            Err(Error::Config(format!(
                "unknown filename field '{}' (expected CollectionIdentifier or Title)",
                name
            )))
        }
    }

    pub fn value<'a>(&self, record: &'a CatalogRecord) -> &'a str {
        match self {
            NameField::Identifier => &record.identifier,
            NameField::Title => &record.title,
        }
    }
}

/// Ordered list of fields used to name output files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFormat {
    fields: Vec<NameField>,
}

impl NameFormat {
    /// Parses a comma-separated field list such as `Title,CollectionIdentifier`.
    /// An empty string yields the default `ead_<ID>` naming.
    pub fn parse(flag: &str) -> Result<Self> {
        let fields = flag
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(NameField::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[NameField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn is_blocked(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '`' | '!' | '@' | '#' | '$' | '%' | '^' | '&' | '*' | '(' | ')' | '+' | '=' | '{' | '}'
                | '[' | ']' | '|' | ':' | ';' | '"' | '<' | '>' | '/' | '?' | ',' | '.'
        )
}

/// Replaces every unsafe character with an underscore, one for one.
pub fn sanitize_filename(name: &str) -> String {
    name.chars().map(|c| if is_blocked(c) { '_' } else { c }).collect()
}

/// Derives the file stem (no extension) for a record.
pub fn generate_filename(record: &CatalogRecord, format: &NameFormat) -> String {
    let parts: Vec<&str> = format
        .fields()
        .iter()
        .map(|field| field.value(record))
        .filter(|value| !value.is_empty())
        .collect();

    if parts.is_empty() {
        return format!("{}_{}", FALLBACK_PREFIX, record.id);
    }

    format!("{}_{}", sanitize_filename(&parts.join(PART_SEPARATOR)), record.id)
}
