//! PDF loader: rasterize pages, extract a table per page, tag and concatenate.

use std::io::Cursor;
use std::path::Path;

use image::RgbaImage;

use crate::error::{IngestError, IngestResult};
use crate::extract::TableExtractor;
use crate::table::{Column, Table, Value};

use super::observability::{IngestContext, IngestDiagnostic, IngestObserver};
use super::SourceFormat;

/// Name of the 1-based page tag column added to every extracted page.
pub const PAGE_NUMBER_COLUMN: &str = "page_number";
/// Name of the source-identifier tag column added to every extracted page.
pub const SOURCE_COLUMN: &str = "source";

/// Page rasterization backend.
///
/// Concrete renderers (pdfium, poppler, a GPU rasterizer) are host-provided
/// black boxes; the loader only needs one RGBA image per page, in page order.
pub trait PdfRasterizer: Send + Sync {
    /// Render every page of the document at `path`, in page order.
    fn rasterize(&self, path: &Path) -> anyhow::Result<Vec<RgbaImage>>;
}

/// Load a PDF document into a single [`Table`].
///
/// Every page is rasterized and run through the extraction chain serially, in
/// page order. Each non-empty page table is tagged with [`PAGE_NUMBER_COLUMN`]
/// and [`SOURCE_COLUMN`] and all pages are concatenated row-wise. A page that
/// extracts to an empty table contributes zero rows without failing the
/// document; if every page is empty the result is the canonical empty table.
pub fn load_pdf_path(
    path: impl AsRef<Path>,
    source_id: &str,
    extractor: &TableExtractor,
    rasterizer: &dyn PdfRasterizer,
    observer: Option<&dyn IngestObserver>,
) -> IngestResult<Table> {
    let path = path.as_ref();
    let pages = rasterizer
        .rasterize(path)
        .map_err(|e| IngestError::Parse {
            source_id: source_id.to_string(),
            message: format!("pdf rasterization failed: {e}"),
        })?;

    let ctx = IngestContext {
        source_id: source_id.to_string(),
        format: SourceFormat::Pdf,
    };

    let mut page_tables: Vec<Table> = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_no = idx + 1;
        let png = encode_png(page, source_id, page_no)?;
        let mut table = extractor.extract(&png, &format!("{source_id}#page{page_no}"));

        if table.row_count() == 0 {
            if let Some(obs) = observer {
                obs.on_diagnostic(&ctx, &IngestDiagnostic::PageSkipped { page: page_no });
            }
            continue;
        }

        tag_page(&mut table, page_no, source_id);
        page_tables.push(table);
    }

    Ok(Table::concat_rows(&page_tables))
}

fn encode_png(page: &RgbaImage, source_id: &str, page_no: usize) -> IngestResult<Vec<u8>> {
    let mut buf = Vec::new();
    page.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| IngestError::Parse {
            source_id: source_id.to_string(),
            message: format!("failed to encode page {page_no}: {e}"),
        })?;
    Ok(buf)
}

fn tag_page(table: &mut Table, page_no: usize, source_id: &str) {
    let rows = table.row_count();
    // An extracted table could itself carry a column named like a tag; leave
    // such a column alone rather than panicking on the name collision.
    if table.column(PAGE_NUMBER_COLUMN).is_none() {
        table.push_column(Column::new(
            PAGE_NUMBER_COLUMN,
            vec![Value::Int64(page_no as i64); rows],
        ));
    }
    if table.column(SOURCE_COLUMN).is_none() {
        table.push_column(Column::new(
            SOURCE_COLUMN,
            vec![Value::Utf8(source_id.to_string()); rows],
        ));
    }
}
