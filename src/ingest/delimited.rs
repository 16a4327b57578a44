//! Delimited-text (CSV/TSV) loader.
//!
//! Contract for ragged input: this loader is LENIENT. Rows with fewer fields
//! than the header are right-padded with nulls and rows with more fields are
//! truncated to the header width. Malformed quoting is still a structural
//! [`IngestError::Csv`] error.

use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::table::Table;

/// Options for the delimited-text loader.
#[derive(Debug, Clone)]
pub struct DelimitedOptions {
    /// Field delimiter; comma by default, tab for `.tsv` sources.
    pub delimiter: u8,
    /// Text encoding label understood by `encoding_rs` (default `utf-8`).
    pub encoding: String,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: "utf-8".to_string(),
        }
    }
}

/// Load a delimited-text file into a [`Table`].
///
/// The first row is the header; cell types are inferred per column.
pub fn load_delimited_path(
    path: impl AsRef<Path>,
    options: &DelimitedOptions,
) -> IngestResult<Table> {
    let bytes = std::fs::read(path.as_ref())?;
    load_delimited_bytes(&bytes, &path.as_ref().display().to_string(), options)
}

/// Load delimited-text bytes (a file body or an in-memory string) into a
/// [`Table`], decoding with the configured encoding first.
pub fn load_delimited_bytes(
    bytes: &[u8],
    source_id: &str,
    options: &DelimitedOptions,
) -> IngestResult<Table> {
    let encoding = encoding_rs::Encoding::for_label(options.encoding.as_bytes()).ok_or_else(
        || IngestError::Parse {
            source_id: source_id.to_string(),
            message: format!("unknown encoding label '{}'", options.encoding),
        },
    )?;
    // Lenient decode: undecodable bytes become replacement characters rather
    // than failing the whole source.
    let (text, _, _) = encoding.decode(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => return Ok(Table::empty()),
    };

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in records {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.trim().is_empty() {
                        None
                    } else {
                        Some(f.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table::from_string_rows(header, rows))
}
