//! Unified ingestion entry point.
//!
//! [`load`] accepts a path, a byte buffer, or an already-built table, resolves
//! the declared/inferred format token onto the canonical set
//! {delimited, spreadsheet, pdf, image}, and dispatches to the matching
//! loader. Nothing is cached between calls; each call performs a fresh load.

use std::fmt;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IngestError, IngestResult};
use crate::extract::TableExtractor;
use crate::table::Table;

use super::delimited::{self, DelimitedOptions};
use super::observability::{IngestContext, IngestObserver, IngestSeverity, IngestStats};
use super::pdf::{self, PdfRasterizer};
use super::{image as image_loader, spreadsheet};

/// Canonical source formats after token normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma/tab-separated text.
    Delimited,
    /// Excel-style workbooks.
    Spreadsheet,
    /// PDF documents (rasterized page by page).
    Pdf,
    /// Raster images of tables.
    Image,
}

impl SourceFormat {
    /// Normalize a declared type token or file extension (case-insensitive)
    /// onto the canonical format set.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" | "delimited" => Some(Self::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" | "excel" | "spreadsheet" => {
                Some(Self::Spreadsheet)
            }
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" | "bmp" | "tif" | "tiff" | "image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// The source of a load: a filesystem path, an in-memory byte buffer, or a
/// table that is returned unchanged (identity passthrough).
#[derive(Debug, Clone)]
pub enum Source {
    /// Filesystem path.
    Path(PathBuf),
    /// Raw bytes; requires a declared format token in [`LoadOptions::format`].
    Bytes(Vec<u8>),
    /// Already-normalized table.
    Table(Table),
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Source::Path(PathBuf::from(s))
    }
}

impl From<&Path> for Source {
    fn from(p: &Path) -> Self {
        Source::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(p: PathBuf) -> Self {
        Source::Path(p)
    }
}

impl From<Vec<u8>> for Source {
    fn from(b: Vec<u8>) -> Self {
        Source::Bytes(b)
    }
}

impl From<Table> for Source {
    fn from(t: Table) -> Self {
        Source::Table(t)
    }
}

/// Options controlling a single load.
///
/// Use [`Default`] for common cases. PDF and image sources additionally need
/// an extractor (and, for PDFs, a rasterizer).
#[derive(Clone, Default)]
pub struct LoadOptions {
    /// Declared format token (`csv`, `excel`, `pdf`, `png`, ...). When `None`
    /// and the source is a path, the file extension is used.
    pub format: Option<String>,
    /// Named worksheet for spreadsheet sources; first sheet when `None`.
    pub sheet_name: Option<String>,
    /// Text encoding label for delimited sources; `utf-8` when `None`.
    pub encoding: Option<String>,
    /// Field delimiter override for delimited sources; inferred from the
    /// token/extension when `None` (tab for `tsv`, comma otherwise).
    pub delimiter: Option<u8>,
    /// Extraction chain for pdf/image sources.
    pub extractor: Option<Arc<TableExtractor>>,
    /// Page rasterizer for pdf sources.
    pub rasterizer: Option<Arc<dyn PdfRasterizer>>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestObserver>>,
    /// Severity threshold at which `on_alert` is invoked; `None` means only
    /// critical failures alert.
    pub alert_at_or_above: Option<IngestSeverity>,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("format", &self.format)
            .field("sheet_name", &self.sheet_name)
            .field("encoding", &self.encoding)
            .field("delimiter", &self.delimiter)
            .field("extractor_set", &self.extractor.is_some())
            .field("rasterizer_set", &self.rasterizer.is_some())
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

/// Load a source into a [`Table`].
///
/// - A [`Source::Table`] is returned unchanged.
/// - For paths, the format comes from [`LoadOptions::format`] or the file
///   extension; an unrecognized token fails with
///   [`IngestError::UnsupportedFormat`].
/// - For byte buffers, a declared format token is required. PDF bytes are
///   spooled to a scoped temporary file (deleted on every exit path) because
///   rasterizers need path access.
///
/// When an observer is configured, success/failure/alerts are reported to it.
pub fn load(source: impl Into<Source>, options: &LoadOptions) -> IngestResult<Table> {
    match source.into() {
        Source::Table(t) => Ok(t),
        Source::Path(path) => {
            let token = declared_or_extension_token(options, &path)?;
            let format = resolve_format(&token, &path.display().to_string())?;
            let source_id = path.display().to_string();
            observe(options, &source_id, format, || {
                dispatch_path(&path, format, &token, &source_id, options)
            })
        }
        Source::Bytes(bytes) => {
            let source_id = "<bytes>".to_string();
            let token = options
                .format
                .clone()
                .ok_or_else(|| IngestError::UnsupportedFormat {
                    token: "(none)".to_string(),
                    source_id: source_id.clone(),
                })?;
            let format = resolve_format(&token, &source_id)?;
            observe(options, &source_id, format, || {
                dispatch_bytes(&bytes, format, &token, &source_id, options)
            })
        }
    }
}

fn declared_or_extension_token(options: &LoadOptions, path: &Path) -> IngestResult<String> {
    if let Some(token) = &options.format {
        return Ok(token.clone());
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| IngestError::UnsupportedFormat {
            token: "(no extension)".to_string(),
            source_id: path.display().to_string(),
        })
}

fn resolve_format(token: &str, source_id: &str) -> IngestResult<SourceFormat> {
    SourceFormat::from_token(token).ok_or_else(|| IngestError::UnsupportedFormat {
        token: token.to_string(),
        source_id: source_id.to_string(),
    })
}

fn delimited_options(options: &LoadOptions, token: &str) -> DelimitedOptions {
    let defaults = DelimitedOptions::default();
    DelimitedOptions {
        delimiter: options.delimiter.unwrap_or(if token.eq_ignore_ascii_case("tsv") {
            b'\t'
        } else {
            defaults.delimiter
        }),
        encoding: options.encoding.clone().unwrap_or(defaults.encoding),
    }
}

fn dispatch_path(
    path: &Path,
    format: SourceFormat,
    token: &str,
    source_id: &str,
    options: &LoadOptions,
) -> IngestResult<Table> {
    match format {
        SourceFormat::Delimited => {
            delimited::load_delimited_path(path, &delimited_options(options, token))
        }
        SourceFormat::Spreadsheet => {
            spreadsheet::load_workbook_path(path, options.sheet_name.as_deref())
        }
        SourceFormat::Pdf => {
            let extractor = require_extractor(options, source_id)?;
            let rasterizer = require_rasterizer(options, source_id)?;
            pdf::load_pdf_path(
                path,
                source_id,
                extractor,
                rasterizer.as_ref(),
                options.observer.as_deref(),
            )
        }
        SourceFormat::Image => {
            let extractor = require_extractor(options, source_id)?;
            image_loader::load_image_path(path, extractor)
        }
    }
}

fn dispatch_bytes(
    bytes: &[u8],
    format: SourceFormat,
    token: &str,
    source_id: &str,
    options: &LoadOptions,
) -> IngestResult<Table> {
    match format {
        SourceFormat::Delimited => {
            delimited::load_delimited_bytes(bytes, source_id, &delimited_options(options, token))
        }
        SourceFormat::Spreadsheet => {
            spreadsheet::load_workbook_reader(Cursor::new(bytes), options.sheet_name.as_deref(), source_id)
        }
        SourceFormat::Pdf => {
            let extractor = require_extractor(options, source_id)?;
            let rasterizer = require_rasterizer(options, source_id)?;
            // Rasterizers need path access; spool to a scoped temp file that
            // the guard deletes on success, error, and early return alike.
            let mut tmp = tempfile::Builder::new()
                .prefix("tabular-ingest-")
                .suffix(".pdf")
                .tempfile()?;
            tmp.write_all(bytes)?;
            tmp.flush()?;
            pdf::load_pdf_path(
                tmp.path(),
                source_id,
                extractor,
                rasterizer.as_ref(),
                options.observer.as_deref(),
            )
        }
        SourceFormat::Image => {
            let extractor = require_extractor(options, source_id)?;
            Ok(extractor.extract(bytes, source_id))
        }
    }
}

fn require_extractor<'a>(
    options: &'a LoadOptions,
    source_id: &str,
) -> IngestResult<&'a TableExtractor> {
    options
        .extractor
        .as_deref()
        .ok_or_else(|| IngestError::MissingBackend {
            backend: "table extractor",
            source_id: source_id.to_string(),
        })
}

fn require_rasterizer<'a>(
    options: &'a LoadOptions,
    source_id: &str,
) -> IngestResult<&'a Arc<dyn PdfRasterizer>> {
    options
        .rasterizer
        .as_ref()
        .ok_or_else(|| IngestError::MissingBackend {
            backend: "pdf rasterizer",
            source_id: source_id.to_string(),
        })
}

fn observe<F>(
    options: &LoadOptions,
    source_id: &str,
    format: SourceFormat,
    run: F,
) -> IngestResult<Table>
where
    F: FnOnce() -> IngestResult<Table>,
{
    let result = run();

    if let Some(obs) = options.observer.as_ref() {
        let ctx = IngestContext {
            source_id: source_id.to_string(),
            format,
        };
        match &result {
            Ok(table) => obs.on_success(
                &ctx,
                IngestStats {
                    rows: table.row_count(),
                    columns: table.column_count(),
                },
            ),
            Err(e) => {
                let severity = severity_for_error(e);
                obs.on_failure(&ctx, severity, e);
                let threshold = options.alert_at_or_above.unwrap_or(IngestSeverity::Critical);
                if severity >= threshold {
                    obs.on_alert(&ctx, severity, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &IngestError) -> IngestSeverity {
    match e {
        IngestError::Io(_) => IngestSeverity::Critical,
        IngestError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestSeverity::Critical,
            _ => IngestSeverity::Error,
        },
        _ => IngestSeverity::Error,
    }
}
