use thiserror::Error;

/// Convenience result type for ingestion and cleaning operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type shared across the facade, format loaders, and cleaner.
///
/// Extraction-quality failures (vision model errors, OCR producing no
/// structure) are deliberately absent: those degrade to an empty or
/// single-text-column [`crate::table::Table`] instead of raising.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-text parsing error from the CSV reader.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook parsing error.
    #[error("spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    /// Unrecognized format token or file extension.
    #[error("unsupported format '{token}' for source {source_id}")]
    UnsupportedFormat { token: String, source_id: String },

    /// The source cannot be structurally parsed by the chosen loader.
    #[error("failed to parse {source_id}: {message}")]
    Parse { source_id: String, message: String },

    /// A named worksheet is missing from the workbook.
    #[error("sheet '{sheet}' not found (available: {available:?})")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    /// Unrecognized missing-value strategy token.
    #[error("unknown missing-value strategy '{token}' (expected auto/drop/mean/median/mode/zero)")]
    UnknownStrategy { token: String },

    /// A pdf or image source was requested but no extraction backend is configured.
    #[error("no {backend} configured for source {source_id}")]
    MissingBackend {
        backend: &'static str,
        source_id: String,
    },
}
