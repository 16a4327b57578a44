//! The normalized in-memory tabular structure produced by every loader.
//!
//! A [`Table`] is an ordered list of named [`Column`]s. Column names are unique
//! within a table and all columns have the same length. A table with zero rows
//! (or zero columns) is valid and signals "no data extracted" to callers; it is
//! a soft failure, not an error.

use serde::Serialize;

/// Inferred semantic type of a column.
///
/// Inference looks only at non-null values; an all-null column is
/// [`ColumnType::Categorical`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// All non-null values are integers or floats.
    Numeric,
    /// Text, booleans, or mixed values.
    Categorical,
    /// All non-null values parse as a calendar date or timestamp.
    DatetimeCandidate,
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Parse a raw text cell into the narrowest matching value.
    ///
    /// Empty or whitespace-only cells become [`Value::Null`]. Integers are
    /// preferred over floats; `true`/`false` (case-insensitive) become bools;
    /// everything else stays text.
    pub fn parse_cell(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Int64(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float64(f);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Utf8(trimmed.to_owned()),
        }
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Append a canonical, collision-free encoding of this value to `buf`.
    ///
    /// Used to key rows for duplicate detection and values for unique counts.
    /// Floats are keyed by their bit pattern so that equal cells compare equal
    /// without going through `f64: Eq`.
    pub(crate) fn write_key(&self, buf: &mut String) {
        use std::fmt::Write;
        match self {
            Value::Null => buf.push('n'),
            Value::Int64(i) => {
                let _ = write!(buf, "i{i}");
            }
            Value::Float64(f) => {
                let _ = write!(buf, "f{:x}", f.to_bits());
            }
            Value::Bool(b) => {
                let _ = write!(buf, "b{b}");
            }
            Value::Utf8(s) => {
                let _ = write!(buf, "s{s}");
            }
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

fn looks_like_datetime(s: &str) -> bool {
    DATETIME_FORMATS.iter().any(|fmt| {
        chrono::NaiveDate::parse_from_str(s, fmt).is_ok()
            || chrono::NaiveDateTime::parse_from_str(s, fmt).is_ok()
    })
}

/// Infer a column type from its values.
pub fn infer_column_type(values: &[Value]) -> ColumnType {
    let mut saw_any = false;
    let mut all_numeric = true;
    let mut all_datetime = true;
    for v in values {
        match v {
            Value::Null => continue,
            Value::Int64(_) | Value::Float64(_) => {
                saw_any = true;
                all_datetime = false;
            }
            Value::Utf8(s) => {
                saw_any = true;
                all_numeric = false;
                if all_datetime && !looks_like_datetime(s) {
                    all_datetime = false;
                }
            }
            Value::Bool(_) => {
                saw_any = true;
                all_numeric = false;
                all_datetime = false;
            }
        }
    }
    if !saw_any {
        ColumnType::Categorical
    } else if all_numeric {
        ColumnType::Numeric
    } else if all_datetime {
        ColumnType::DatetimeCandidate
    } else {
        ColumnType::Categorical
    }
}

/// A named, typed sequence of nullable cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Inferred semantic type.
    pub ctype: ColumnType,
    /// Cell values, one per table row.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column, inferring its type from `values`.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let ctype = infer_column_type(&values);
        Self {
            name: name.into(),
            ctype,
            values,
        }
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }
}

/// In-memory table: ordered, uniquely named, equal-length columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// The canonical empty table (no columns, no rows).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from pre-built columns.
    ///
    /// # Panics
    ///
    /// Panics if column lengths differ or names collide; loaders always
    /// construct satisfying both.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        if let Some(first) = columns.first() {
            let len = first.values.len();
            for c in &columns {
                assert!(
                    c.values.len() == len,
                    "column '{}' has {} values, expected {}",
                    c.name,
                    c.values.len(),
                    len
                );
            }
        }
        for (i, c) in columns.iter().enumerate() {
            assert!(
                !columns[..i].iter().any(|o| o.name == c.name),
                "duplicate column name '{}'",
                c.name
            );
        }
        Self { columns }
    }

    /// Build a table from a header and row-major typed cells.
    ///
    /// Ragged rows are repaired: short rows are right-padded with nulls, long
    /// rows truncated to the header width. Duplicate header names get `.1`,
    /// `.2`, ... suffixes. Column types are inferred.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = header.len();
        let names = dedupe_names(header);

        let mut column_values: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); width];
        for mut row in rows {
            row.resize(width, Value::Null);
            for (col, v) in row.into_iter().take(width).enumerate() {
                column_values[col].push(v);
            }
        }

        let columns = names
            .into_iter()
            .zip(column_values)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::from_columns(columns)
    }

    /// Build a table from a header and row-major raw text cells.
    ///
    /// `None` cells become nulls; `Some` cells go through [`Value::parse_cell`].
    /// Ragged rows are repaired as in [`Table::from_rows`].
    pub fn from_string_rows(header: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let typed = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        None => Value::Null,
                        Some(s) => Value::parse_cell(&s),
                    })
                    .collect()
            })
            .collect();
        Self::from_rows(header, typed)
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no columns and no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The row at `idx` as borrowed cells, in column order.
    pub fn row(&self, idx: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }

    /// Append a column of equal length.
    ///
    /// # Panics
    ///
    /// Panics if the length differs from the current row count or the name is
    /// already taken.
    pub fn push_column(&mut self, column: Column) {
        if !self.columns.is_empty() {
            assert!(
                column.values.len() == self.row_count(),
                "column '{}' has {} values, expected {}",
                column.name,
                column.values.len(),
                self.row_count()
            );
        }
        assert!(
            self.column(&column.name).is_none(),
            "duplicate column name '{}'",
            column.name
        );
        self.columns.push(column);
    }

    /// Canonical key for the row at `idx`, for duplicate detection.
    pub(crate) fn row_key(&self, idx: usize) -> String {
        let mut key = String::new();
        for c in &self.columns {
            c.values[idx].write_key(&mut key);
            key.push('\u{1f}');
        }
        key
    }

    /// New table keeping only the rows at `indices`, preserving order.
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                ctype: c.ctype,
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        Table { columns }
    }

    /// Concatenate tables row-wise, preserving input order.
    ///
    /// Column names are unioned in first-seen order; cells absent from a given
    /// table are filled with nulls (column types are re-inferred over the
    /// merged values). Empty inputs contribute nothing; an empty input list
    /// yields the canonical empty table.
    pub fn concat_rows(tables: &[Table]) -> Table {
        let mut names: Vec<String> = Vec::new();
        for t in tables {
            for c in &t.columns {
                if !names.contains(&c.name) {
                    names.push(c.name.clone());
                }
            }
        }
        if names.is_empty() {
            return Table::empty();
        }

        let mut merged: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
        for t in tables {
            let rows = t.row_count();
            for (out, name) in merged.iter_mut().zip(&names) {
                match t.column(name) {
                    Some(c) => out.extend(c.values.iter().cloned()),
                    None => out.extend(std::iter::repeat(Value::Null).take(rows)),
                }
            }
        }

        let columns = names
            .into_iter()
            .zip(merged)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Table::from_columns(columns)
    }
}

fn dedupe_names(header: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for raw in header {
        let base = if raw.trim().is_empty() {
            "unnamed".to_string()
        } else {
            raw.trim().to_string()
        };
        let mut candidate = base.clone();
        let mut n = 0usize;
        while names.contains(&candidate) {
            n += 1;
            candidate = format!("{base}.{n}");
        }
        names.push(candidate);
    }
    names
}
