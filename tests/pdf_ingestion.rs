use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::{GrayImage, RgbaImage};
use tabular_ingest::ingest::pdf::{load_pdf_path, PdfRasterizer};
use tabular_ingest::ingest::{load, LoadOptions, PAGE_NUMBER_COLUMN, SOURCE_COLUMN};
use tabular_ingest::extract::{OcrEngine, TableExtractor};
use tabular_ingest::table::Value;
use tabular_ingest::IngestError;

/// Renders a fixed number of blank pages regardless of the document.
struct FakeRasterizer {
    pages: usize,
}

impl PdfRasterizer for FakeRasterizer {
    fn rasterize(&self, _path: &Path) -> anyhow::Result<Vec<RgbaImage>> {
        Ok((0..self.pages)
            .map(|_| RgbaImage::from_pixel(32, 32, image::Rgba([255, 255, 255, 255])))
            .collect())
    }
}

struct BrokenRasterizer;

impl PdfRasterizer for BrokenRasterizer {
    fn rasterize(&self, _path: &Path) -> anyhow::Result<Vec<RgbaImage>> {
        anyhow::bail!("cannot open document")
    }
}

/// Returns one canned text per recognize call, in order.
struct SequenceOcr {
    outputs: Mutex<VecDeque<String>>,
}

impl SequenceOcr {
    fn new(outputs: &[&str]) -> Self {
        Self {
            outputs: Mutex::new(outputs.iter().map(|s| s.to_string()).collect()),
        }
    }
}

impl OcrEngine for SequenceOcr {
    fn recognize(&self, _binarized: &GrayImage) -> anyhow::Result<String> {
        Ok(self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

#[test]
fn pages_are_tagged_and_concatenated_in_order() {
    let extractor =
        TableExtractor::new(Arc::new(SequenceOcr::new(&["a,b\n1,2\n3,4", "a,b\n5,6"])));
    let rasterizer = FakeRasterizer { pages: 2 };

    let table = load_pdf_path(
        Path::new("report.pdf"),
        "report.pdf",
        &extractor,
        &rasterizer,
        None,
    )
    .unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(
        table.column_names(),
        vec!["a", "b", PAGE_NUMBER_COLUMN, SOURCE_COLUMN]
    );
    assert_eq!(
        table.column(PAGE_NUMBER_COLUMN).unwrap().values,
        vec![Value::Int64(1), Value::Int64(1), Value::Int64(2)]
    );
    assert_eq!(
        table.column(SOURCE_COLUMN).unwrap().values[0],
        Value::Utf8("report.pdf".to_string())
    );
}

#[test]
fn empty_page_is_skipped_without_failing_the_document() {
    // Page 2 extracts to nothing; pages 1 and 3 survive, order preserved.
    let extractor =
        TableExtractor::new(Arc::new(SequenceOcr::new(&["a,b\n1,2", "", "a,b\n5,6"])));
    let rasterizer = FakeRasterizer { pages: 3 };

    let table = load_pdf_path(
        Path::new("report.pdf"),
        "report.pdf",
        &extractor,
        &rasterizer,
        None,
    )
    .unwrap();

    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.column(PAGE_NUMBER_COLUMN).unwrap().values,
        vec![Value::Int64(1), Value::Int64(3)]
    );
}

#[test]
fn all_empty_pages_yield_the_empty_table() {
    let extractor = TableExtractor::new(Arc::new(SequenceOcr::new(&["", "", ""])));
    let rasterizer = FakeRasterizer { pages: 3 };

    let table = load_pdf_path(
        Path::new("blank.pdf"),
        "blank.pdf",
        &extractor,
        &rasterizer,
        None,
    )
    .unwrap();

    assert!(table.is_empty());
}

#[test]
fn pages_with_differing_columns_are_unioned() {
    let extractor =
        TableExtractor::new(Arc::new(SequenceOcr::new(&["a,b\n1,2", "b,c\n3,4"])));
    let rasterizer = FakeRasterizer { pages: 2 };

    let table = load_pdf_path(
        Path::new("mixed.pdf"),
        "mixed.pdf",
        &extractor,
        &rasterizer,
        None,
    )
    .unwrap();

    assert_eq!(
        table.column_names(),
        vec!["a", "b", PAGE_NUMBER_COLUMN, SOURCE_COLUMN, "c"]
    );
    assert_eq!(table.column("a").unwrap().values[1], Value::Null);
    assert_eq!(table.column("c").unwrap().values[0], Value::Null);
}

#[test]
fn rasterizer_failure_is_a_parse_error() {
    let extractor = TableExtractor::new(Arc::new(SequenceOcr::new(&[])));

    let err = load_pdf_path(
        Path::new("broken.pdf"),
        "broken.pdf",
        &extractor,
        &BrokenRasterizer,
        None,
    )
    .unwrap_err();

    assert!(matches!(err, IngestError::Parse { .. }));
    assert!(err.to_string().contains("rasterization failed"));
}

#[test]
fn facade_spools_pdf_bytes_to_a_temp_file() {
    let extractor = TableExtractor::new(Arc::new(SequenceOcr::new(&["a,b\n1,2"])));
    let opts = LoadOptions {
        format: Some("pdf".to_string()),
        extractor: Some(Arc::new(extractor)),
        rasterizer: Some(Arc::new(FakeRasterizer { pages: 1 })),
        ..Default::default()
    };

    let table = load(b"%PDF-1.4 fake body".to_vec(), &opts).unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(
        table.column(SOURCE_COLUMN).unwrap().values[0],
        Value::Utf8("<bytes>".to_string())
    );
}

#[test]
fn facade_requires_a_rasterizer_for_pdfs() {
    let extractor = TableExtractor::new(Arc::new(SequenceOcr::new(&[])));
    let opts = LoadOptions {
        format: Some("pdf".to_string()),
        extractor: Some(Arc::new(extractor)),
        ..Default::default()
    };

    let err = load(b"%PDF-1.4".to_vec(), &opts).unwrap_err();
    assert!(matches!(err, IngestError::MissingBackend { .. }));
}
