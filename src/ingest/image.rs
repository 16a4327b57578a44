//! Image loader: a single image through the extraction chain, no page tagging.

use std::path::Path;

use crate::error::IngestResult;
use crate::extract::TableExtractor;
use crate::table::Table;

/// Load a raster image of a table into a [`Table`].
///
/// Reading the file can fail with an I/O error; extraction itself never
/// fails (see [`TableExtractor::extract`]).
pub fn load_image_path(path: impl AsRef<Path>, extractor: &TableExtractor) -> IngestResult<Table> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    Ok(extractor.extract(&bytes, &path.display().to_string()))
}
