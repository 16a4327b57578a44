//! Spreadsheet/workbook loader built on `calamine`.

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};

use crate::error::{IngestError, IngestResult};
use crate::table::{Table, Value};

/// Load a workbook file into a [`Table`].
///
/// Reads `sheet_name` if given (failing with [`IngestError::SheetNotFound`]
/// when absent), otherwise the first sheet. The first non-empty row is the
/// header; column types are inferred from the cells below it.
pub fn load_workbook_path(
    path: impl AsRef<Path>,
    sheet_name: Option<&str>,
) -> IngestResult<Table> {
    let path = path.as_ref();
    let workbook = open_workbook_auto(path)?;
    load_workbook(workbook, sheet_name, &path.display().to_string())
}

/// Load workbook bytes (any `Read + Seek`, e.g. a `Cursor`) into a [`Table`].
pub fn load_workbook_reader<RS: Read + Seek + Clone>(
    reader: RS,
    sheet_name: Option<&str>,
    source_id: &str,
) -> IngestResult<Table> {
    let workbook = open_workbook_auto_from_rs(reader)?;
    load_workbook(workbook, sheet_name, source_id)
}

fn load_workbook<RS: Read + Seek>(
    mut workbook: Sheets<RS>,
    sheet_name: Option<&str>,
    source_id: &str,
) -> IngestResult<Table> {
    let available = workbook.sheet_names().to_vec();

    let sheet = match sheet_name {
        Some(name) => {
            if !available.iter().any(|s| s == name) {
                return Err(IngestError::SheetNotFound {
                    sheet: name.to_string(),
                    available,
                });
            }
            name.to_string()
        }
        None => available
            .first()
            .cloned()
            .ok_or_else(|| IngestError::Parse {
                source_id: source_id.to_string(),
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    Ok(table_from_range(&range))
}

fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows_iter = range.rows().enumerate();

    // First non-empty row is the header.
    let header_entry = rows_iter
        .by_ref()
        .find(|(_, row)| row.iter().any(|c| !matches!(c, Data::Empty)));
    let Some((_, header_row)) = header_entry else {
        return Table::empty();
    };
    let header: Vec<String> = header_row.iter().map(cell_to_header_string).collect();

    let rows: Vec<Vec<Value>> = rows_iter
        .map(|(_, row)| row.iter().map(convert_cell).collect())
        .collect();

    Table::from_rows(header, rows)
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                Value::Int64(*f as i64)
            } else {
                Value::Float64(*f)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::Utf8(trimmed.to_string())
            }
        }
        Data::DateTime(dt) => Value::Utf8(dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Utf8(s.clone()),
        // Formula errors surface as missing cells.
        Data::Error(_) => Value::Null,
    }
}
