//! Human-readable shape summary for a [`Table`], consumed by calling layers
//! (chat/agent/API) to describe a load result.

use std::fmt;

use serde::Serialize;

use crate::table::{ColumnType, Table};

/// Per-column statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    /// Column name.
    pub name: String,
    /// Inferred semantic type.
    pub ctype: ColumnType,
    /// Number of null cells.
    pub missing: usize,
    /// Number of distinct non-null values.
    pub unique: usize,
}

/// Shape summary of a table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub columns: usize,
    /// Per-column statistics in column order.
    pub column_summaries: Vec<ColumnSummary>,
}

/// Summarize a table's shape and per-column stats.
pub fn describe(table: &Table) -> TableSummary {
    let column_summaries = table
        .columns()
        .iter()
        .map(|col| {
            let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
            for v in &col.values {
                if !v.is_null() {
                    let mut key = String::new();
                    v.write_key(&mut key);
                    seen.insert(key);
                }
            }
            ColumnSummary {
                name: col.name.clone(),
                ctype: col.ctype,
                missing: col.null_count(),
                unique: seen.len(),
            }
        })
        .collect();

    TableSummary {
        rows: table.row_count(),
        columns: table.column_count(),
        column_summaries,
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} rows x {} columns", self.rows, self.columns)?;
        for c in &self.column_summaries {
            writeln!(
                f,
                "  {name}: {ctype:?} missing={missing} unique={unique}",
                name = c.name,
                ctype = c.ctype,
                missing = c.missing,
                unique = c.unique
            )?;
        }
        Ok(())
    }
}
