//! Ingestion entrypoints and per-format loaders.
//!
//! Most callers should use [`load`] (from [`unified`]) which:
//!
//! - normalizes declared type tokens / file extensions onto the canonical
//!   format set {delimited, spreadsheet, pdf, image}
//! - dispatches to the matching loader, adapting byte buffers to paths
//!   through scoped temp files where needed
//! - optionally reports success/failure/alerts to an [`IngestObserver`]
//!
//! Format-specific functions are also available under:
//! - [`delimited`]
//! - [`spreadsheet`]
//! - [`pdf`]
//! - [`image`]

pub mod delimited;
pub mod image;
pub mod observability;
pub mod pdf;
pub mod spreadsheet;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestContext, IngestDiagnostic, IngestObserver,
    IngestSeverity, IngestStats, StdErrObserver,
};
pub use pdf::{PdfRasterizer, PAGE_NUMBER_COLUMN, SOURCE_COLUMN};
pub use unified::{load, LoadOptions, Source, SourceFormat};
