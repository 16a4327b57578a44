//! `tabular-ingest` is a library for ingesting heterogeneous tabular sources
//! (CSV/TSV text, Excel workbooks, PDF documents, raster images of tables)
//! into a single normalized in-memory [`table::Table`], plus a configurable
//! statistics-driven cleaning pass (duplicate removal, column-type-aware
//! missing-value imputation).
//!
//! The primary entrypoints are [`ingest::load`], which auto-detects the
//! format from the file extension (or you can declare one via
//! [`ingest::LoadOptions`]), and [`clean::clean`], which applies a
//! [`clean::CleaningPolicy`] and always returns a new table.
//!
//! ## What you can ingest
//!
//! **Formats (normalized from declared tokens or extensions):**
//!
//! - **Delimited text**: `.csv`, `.tsv`, `.txt` (and in-memory buffers)
//! - **Spreadsheets**: `.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`
//! - **PDF**: every page rasterized and run through the extraction chain,
//!   tagged with `page_number` and `source` columns
//! - **Images**: `.png`, `.jpg`, `.bmp`, `.tiff` via the vision-then-OCR
//!   fallback chain in [`extract`]
//!
//! Cell types are inferred per column (numeric, categorical, or
//! datetime-candidate); empty cells become nulls.
//!
//! An extraction that finds no tabular structure does not error: it degrades
//! to a single-`text`-column table, or the empty table. Callers should treat
//! `table.row_count() == 0` as the soft-failure signal.
//!
//! ## Quick example: load and clean delimited text
//!
//! ```
//! use tabular_ingest::clean::{clean, CleaningPolicy};
//! use tabular_ingest::ingest::{load, LoadOptions};
//!
//! # fn main() -> Result<(), tabular_ingest::IngestError> {
//! let opts = LoadOptions {
//!     format: Some("csv".to_string()),
//!     ..Default::default()
//! };
//! let table = load(b"a,b\n1,2\n1,2\n3,\n".to_vec(), &opts)?;
//! assert_eq!(table.row_count(), 3);
//!
//! let cleaned = clean(&table, &CleaningPolicy::default());
//! assert_eq!(cleaned.row_count(), 2); // duplicate collapsed, null imputed
//! # Ok(())
//! # }
//! ```
//!
//! ## Images and PDFs
//!
//! Image-like sources go through [`extract::TableExtractor`]: a vision-model
//! stage (only when a [`extract::VisionModel`] backend such as
//! [`extract::GeminiVision`] is configured, with the API key passed in
//! explicitly) and an OCR stage over a binarized image. The chain never
//! raises; a corrupt or blank image yields an empty or degraded table. PDFs
//! additionally need a host-provided [`ingest::PdfRasterizer`].
//!
//! ## Modules
//!
//! - [`ingest`]: unified entrypoint, per-format loaders, observer interface
//! - [`extract`]: the vision-then-OCR fallback chain for images
//! - [`clean`]: duplicate and missing-value policy engine
//! - [`table`]: the normalized table data model
//! - [`summary`]: `describe` shape summaries for calling layers
//! - [`error`]: the shared error type

pub mod clean;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod summary;
pub mod table;

pub use error::{IngestError, IngestResult};
