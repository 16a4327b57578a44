//! Injected structured logging for ingestion and extraction.
//!
//! The pipeline never prints; callers that want diagnostics attach an
//! [`IngestObserver`] via [`super::LoadOptions`] or
//! [`crate::extract::TableExtractor::with_observer`]. The no-raise guarantee
//! of the extraction chain holds whether or not an observer is attached.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestError;

use super::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about one ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestContext {
    /// Identifier of the source (path, `<bytes>`, `<table>`, or a page-qualified id).
    pub source_id: String,
    /// Canonical format used for the attempt.
    pub format: SourceFormat,
}

/// Shape stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Number of ingested rows.
    pub rows: usize,
    /// Number of ingested columns.
    pub columns: usize,
}

/// Recoverable events absorbed by the pipeline instead of raised.
#[derive(Debug, Clone)]
pub enum IngestDiagnostic {
    /// The vision stage failed (credential, network, or malformed response);
    /// extraction fell through to OCR.
    VisionStageFailed { reason: String },
    /// The vision response had too few usable lines to form a table.
    VisionResponseUnusable { lines: usize },
    /// The OCR stage failed; extraction degraded to an empty table.
    OcrStageFailed { reason: String },
    /// OCR found text but no tabular structure; output is the single-column
    /// `text` table.
    DegradedExtraction { lines: usize },
    /// A PDF page yielded an empty table and contributed no rows.
    PageSkipped { page: usize },
}

impl fmt::Display for IngestDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VisionStageFailed { reason } => {
                write!(f, "vision stage failed, falling back to ocr: {reason}")
            }
            Self::VisionResponseUnusable { lines } => {
                write!(f, "vision response unusable ({lines} lines), falling back to ocr")
            }
            Self::OcrStageFailed { reason } => write!(f, "ocr stage failed: {reason}"),
            Self::DegradedExtraction { lines } => {
                write!(f, "no tabular structure detected, degraded to {lines} text lines")
            }
            Self::PageSkipped { page } => write!(f, "page {page} yielded no rows, skipped"),
        }
    }
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestObserver: Send + Sync {
    /// Called when a load succeeds.
    fn on_success(&self, _ctx: &IngestContext, _stats: IngestStats) {}

    /// Called when a load fails.
    fn on_failure(&self, _ctx: &IngestContext, _severity: IngestSeverity, _error: &IngestError) {}

    /// Called when a failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called for recoverable events the pipeline absorbed (stage fall-through,
    /// degraded extraction, skipped pages).
    fn on_diagnostic(&self, _ctx: &IngestContext, _diagnostic: &IngestDiagnostic) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestContext, stats: IngestStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_diagnostic(&self, ctx: &IngestContext, diagnostic: &IngestDiagnostic) {
        for o in &self.observers {
            o.on_diagnostic(ctx, diagnostic);
        }
    }
}

/// Logs ingestion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestContext, stats: IngestStats) {
        eprintln!(
            "[ingest][ok] format={:?} source={} rows={} cols={}",
            ctx.format, ctx.source_id, stats.rows, stats.columns
        );
    }

    fn on_failure(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        eprintln!(
            "[ingest][{:?}] format={:?} source={} err={}",
            severity, ctx.format, ctx.source_id, error
        );
    }

    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        eprintln!(
            "[ALERT][ingest][{:?}] format={:?} source={} err={}",
            severity, ctx.format, ctx.source_id, error
        );
    }

    fn on_diagnostic(&self, ctx: &IngestContext, diagnostic: &IngestDiagnostic) {
        eprintln!(
            "[ingest][diag] format={:?} source={} {}",
            ctx.format, ctx.source_id, diagnostic
        );
    }
}

/// Appends ingestion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestObserver for FileObserver {
    fn on_success(&self, ctx: &IngestContext, stats: IngestStats) {
        self.append_line(&format!(
            "{} ok format={:?} source={} rows={} cols={}",
            unix_ts(),
            ctx.format,
            ctx.source_id,
            stats.rows,
            stats.columns
        ));
    }

    fn on_failure(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.source_id,
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestContext, severity: IngestSeverity, error: &IngestError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.source_id,
            error
        ));
    }

    fn on_diagnostic(&self, ctx: &IngestContext, diagnostic: &IngestDiagnostic) {
        self.append_line(&format!(
            "{} diag format={:?} source={} {}",
            unix_ts(),
            ctx.format,
            ctx.source_id,
            diagnostic
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
