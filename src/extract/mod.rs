//! Table extraction from raster images: the vision-model-first, OCR-second
//! fallback chain.
//!
//! [`TableExtractor::extract`] never fails. Stage 1 (vision model) runs only
//! when a [`VisionModel`] backend is configured; any credential, network, or
//! response-shape problem falls through to stage 2 (OCR). When neither stage
//! finds tabular structure the output degrades to a single `text` column, or
//! to the canonical empty table when there is nothing at all. Callers iterating
//! PDF pages rely on this: one bad page must not abort the document.

pub mod ocr;
pub mod vision;

use std::sync::Arc;

use crate::ingest::observability::{IngestContext, IngestDiagnostic, IngestObserver};
use crate::ingest::SourceFormat;
use crate::table::Table;

pub use ocr::{binarize, detect_delimiter, OcrConfig, OcrEngine};
pub use vision::{GeminiVision, VisionModel};

const DEFAULT_PROMPT: &str = "Extract the table from this image. Respond with ONLY \
comma-delimited text with a header row. Quote any cell that contains a comma. \
Preserve cell values verbatim, with no explanations or extra text.";

/// Configuration for the extraction chain.
///
/// The prompt wording and OCR tuning are configuration, not code: hosts that
/// need a different instruction or threshold swap the config, not the chain.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Instruction sent to the vision model alongside the image.
    pub prompt: String,
    /// OCR-stage tunables.
    pub ocr: OcrConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            ocr: OcrConfig::default(),
        }
    }
}

/// Intermediate result of one extraction attempt, consumed immediately to
/// build a [`Table`].
enum ExtractionResult {
    /// Rectangular grid: header plus data rows (already shape-repaired).
    Grid {
        header: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    },
    /// No tabular structure; raw text lines.
    Lines(Vec<String>),
}

impl ExtractionResult {
    fn into_table(self) -> Table {
        match self {
            Self::Grid { header, rows } => Table::from_string_rows(header, rows),
            Self::Lines(lines) => {
                if lines.is_empty() {
                    return Table::empty();
                }
                // Raw lines stay verbatim text; no per-cell type parsing.
                let rows = lines
                    .into_iter()
                    .map(|l| vec![crate::table::Value::Utf8(l)])
                    .collect();
                Table::from_rows(vec!["text".to_string()], rows)
            }
        }
    }
}

/// Two-stage table extractor for images.
pub struct TableExtractor {
    vision: Option<Arc<dyn VisionModel>>,
    ocr: Arc<dyn OcrEngine>,
    config: ExtractorConfig,
    observer: Option<Arc<dyn IngestObserver>>,
}

impl std::fmt::Debug for TableExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableExtractor")
            .field("vision_set", &self.vision.is_some())
            .field("observer_set", &self.observer.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl TableExtractor {
    /// Create a chain with only the OCR stage.
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            vision: None,
            ocr,
            config: ExtractorConfig::default(),
            observer: None,
        }
    }

    /// Enable the vision-model stage.
    pub fn with_vision(mut self, vision: Arc<dyn VisionModel>) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Override prompt and OCR tuning.
    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an observer for stage fall-through diagnostics.
    pub fn with_observer(mut self, observer: Arc<dyn IngestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Extract a table from encoded image bytes.
    ///
    /// Never fails: the worst case is the empty table (undecodable image, OCR
    /// failure, no text) or the degraded single-`text`-column table (text but
    /// no detectable structure).
    pub fn extract(&self, image_bytes: &[u8], source_id: &str) -> Table {
        let ctx = IngestContext {
            source_id: source_id.to_string(),
            format: SourceFormat::Image,
        };

        if let Some(vision) = &self.vision {
            if let Some(table) = self.vision_stage(vision.as_ref(), image_bytes, &ctx) {
                return table;
            }
        }

        self.ocr_stage(image_bytes, &ctx).into_table()
    }

    /// Stage 1: submit to the vision model and parse the response as CSV.
    ///
    /// Returns `None` on any failure so the caller falls through to OCR.
    fn vision_stage(
        &self,
        vision: &dyn VisionModel,
        image_bytes: &[u8],
        ctx: &IngestContext,
    ) -> Option<Table> {
        let text = match vision.submit(image_bytes, &self.config.prompt) {
            Ok(text) => text,
            Err(e) => {
                self.diag(ctx, IngestDiagnostic::VisionStageFailed { reason: e.to_string() });
                return None;
            }
        };

        let body = vision::strip_code_fences(&text);
        let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() < 2 {
            self.diag(ctx, IngestDiagnostic::VisionResponseUnusable { lines: lines.len() });
            return None;
        }

        match parse_delimited_grid(&lines.join("\n")) {
            Ok(result) => Some(result.into_table()),
            Err(e) => {
                self.diag(ctx, IngestDiagnostic::VisionStageFailed { reason: e.to_string() });
                None
            }
        }
    }

    /// Stage 2: binarize, recognize, and rebuild rows heuristically.
    fn ocr_stage(&self, image_bytes: &[u8], ctx: &IngestContext) -> ExtractionResult {
        let decoded = match image::load_from_memory(image_bytes) {
            Ok(img) => img,
            Err(e) => {
                self.diag(ctx, IngestDiagnostic::OcrStageFailed { reason: e.to_string() });
                return ExtractionResult::Lines(Vec::new());
            }
        };

        let binarized = binarize(&decoded.to_luma8(), &self.config.ocr);
        let text = match self.ocr.recognize(&binarized) {
            Ok(text) => text,
            Err(e) => {
                self.diag(ctx, IngestDiagnostic::OcrStageFailed { reason: e.to_string() });
                return ExtractionResult::Lines(Vec::new());
            }
        };

        let lines: Vec<String> = text
            .lines()
            .map(|l| l.trim_end_matches('\r').trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if lines.len() < 2 {
            if !lines.is_empty() {
                self.diag(ctx, IngestDiagnostic::DegradedExtraction { lines: lines.len() });
            }
            return ExtractionResult::Lines(lines);
        }

        let delimiter = detect_delimiter(&lines[0], &self.config.ocr.delimiters);
        let header = ocr::split_fields(&lines[0], delimiter);
        if header.is_empty() {
            self.diag(ctx, IngestDiagnostic::DegradedExtraction { lines: lines.len() });
            return ExtractionResult::Lines(lines);
        }

        // Rows shorter than the header are right-padded with nulls, longer
        // rows truncated; from_string_rows enforces both.
        let rows = lines[1..]
            .iter()
            .map(|line| {
                ocr::split_fields(line, delimiter)
                    .into_iter()
                    .map(|f| if f.is_empty() { None } else { Some(f) })
                    .collect()
            })
            .collect();

        ExtractionResult::Grid { header, rows }
    }

    fn diag(&self, ctx: &IngestContext, diagnostic: IngestDiagnostic) {
        if let Some(obs) = &self.observer {
            obs.on_diagnostic(ctx, &diagnostic);
        }
    }
}

/// Parse delimited text (header + data rows) from a vision response.
///
/// Uses a flexible CSV reader so quoted cells survive; ragged rows are
/// repaired against the header width downstream.
fn parse_delimited_grid(text: &str) -> anyhow::Result<ExtractionResult> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(|f| f.trim().to_string()).collect(),
        None => anyhow::bail!("no header row in response"),
    };

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in records {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|f| {
                    let f = f.trim();
                    if f.is_empty() {
                        None
                    } else {
                        Some(f.to_string())
                    }
                })
                .collect(),
        );
    }

    if rows.is_empty() {
        anyhow::bail!("no data rows in response");
    }
    Ok(ExtractionResult::Grid { header, rows })
}
