//! Post-load cleaning: duplicate elimination and missing-value remediation.
//!
//! [`clean`] always returns a new [`Table`]; the input is never mutated, so
//! callers holding the pre-clean table are unaffected. The order is fixed for
//! reproducibility: duplicates are removed first, then the missing-value
//! policy is applied to the deduplicated result.

use std::collections::HashSet;
use std::str::FromStr;

use crate::error::{IngestError, IngestResult};
use crate::table::{Column, ColumnType, Table, Value};

/// Missing-value remediation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingStrategy {
    /// Column-type-aware, per-column thresholded policy (the default).
    ///
    /// Numeric columns with missing fraction `m`: drop the column when
    /// `m > 0.5`, impute the median when `0.3 < m <= 0.5`, impute the mean
    /// otherwise. Categorical columns: drop when `m > 0.5`, else impute the
    /// mode (ties broken by first occurrence).
    #[default]
    Auto,
    /// Remove every row containing any null.
    Drop,
    /// Impute numeric columns with their mean, categorical with their mode.
    Mean,
    /// Impute numeric columns with their median, categorical with their mode.
    Median,
    /// Impute every column with its mode.
    Mode,
    /// Impute numeric columns with 0 and categorical columns with `"Unknown"`.
    Zero,
}

impl FromStr for MissingStrategy {
    type Err = IngestError;

    /// Parse one of the six recognized tokens, failing fast with
    /// [`IngestError::UnknownStrategy`] before any cleaning work happens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "drop" => Ok(Self::Drop),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            "zero" => Ok(Self::Zero),
            _ => Err(IngestError::UnknownStrategy {
                token: s.to_string(),
            }),
        }
    }
}

/// Immutable per-invocation cleaning configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningPolicy {
    /// Apply the missing-value strategy.
    pub handle_missing: bool,
    /// Collapse fully identical rows to their first occurrence.
    pub handle_duplicates: bool,
    /// Strategy used when `handle_missing` is set.
    pub missing_strategy: MissingStrategy,
}

impl Default for CleaningPolicy {
    fn default() -> Self {
        Self {
            handle_missing: true,
            handle_duplicates: true,
            missing_strategy: MissingStrategy::Auto,
        }
    }
}

impl CleaningPolicy {
    /// Build a policy from a raw strategy token.
    pub fn from_token(
        handle_missing: bool,
        handle_duplicates: bool,
        missing_strategy: &str,
    ) -> IngestResult<Self> {
        Ok(Self {
            handle_missing,
            handle_duplicates,
            missing_strategy: missing_strategy.parse()?,
        })
    }
}

/// How a column's nulls were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputeMethod {
    /// Column mean.
    Mean,
    /// Column median.
    Median,
    /// Most frequent value.
    Mode,
    /// Literal zero.
    Zero,
    /// Literal `"Unknown"` placeholder.
    Placeholder,
}

/// One imputation applied during cleaning.
#[derive(Debug, Clone)]
pub struct Imputation {
    /// Column that was filled.
    pub column: String,
    /// Fill method.
    pub method: ImputeMethod,
}

/// What a cleaning pass did, reported to the caller for logging; none of it
/// is embedded in the output table.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    /// Duplicate rows collapsed.
    pub duplicates_removed: usize,
    /// Rows removed by the `drop` strategy.
    pub rows_dropped: usize,
    /// Columns dropped by the `auto` thresholds, in original order.
    pub dropped_columns: Vec<String>,
    /// Columns imputed, in original order.
    pub imputed: Vec<Imputation>,
}

/// Clean a table under `policy`, returning a new table.
pub fn clean(table: &Table, policy: &CleaningPolicy) -> Table {
    clean_with_report(table, policy).0
}

/// Clean a table under `policy`, returning the new table plus a report of
/// what was removed, dropped, and imputed.
pub fn clean_with_report(table: &Table, policy: &CleaningPolicy) -> (Table, CleanReport) {
    let mut report = CleanReport::default();
    let mut cleaned = table.clone();

    if policy.handle_duplicates {
        cleaned = drop_duplicates(&cleaned, &mut report);
    }
    if policy.handle_missing {
        cleaned = handle_missing(&cleaned, policy.missing_strategy, &mut report);
    }

    (cleaned, report)
}

fn drop_duplicates(table: &Table, report: &mut CleanReport) -> Table {
    let rows = table.row_count();
    let mut seen: HashSet<String> = HashSet::with_capacity(rows);
    let mut keep: Vec<usize> = Vec::with_capacity(rows);
    for idx in 0..rows {
        if seen.insert(table.row_key(idx)) {
            keep.push(idx);
        }
    }
    report.duplicates_removed = rows - keep.len();
    if report.duplicates_removed == 0 {
        return table.clone();
    }
    table.take_rows(&keep)
}

fn handle_missing(table: &Table, strategy: MissingStrategy, report: &mut CleanReport) -> Table {
    match strategy {
        MissingStrategy::Drop => drop_null_rows(table, report),
        MissingStrategy::Auto => auto_impute(table, report),
        MissingStrategy::Mean => impute_all(table, report, NumericFill::Mean),
        MissingStrategy::Median => impute_all(table, report, NumericFill::Median),
        MissingStrategy::Mode => mode_impute_all(table, report),
        MissingStrategy::Zero => zero_impute_all(table, report),
    }
}

fn drop_null_rows(table: &Table, report: &mut CleanReport) -> Table {
    let rows = table.row_count();
    let keep: Vec<usize> = (0..rows)
        .filter(|&idx| table.row(idx).iter().all(|v| !v.is_null()))
        .collect();
    report.rows_dropped = rows - keep.len();
    table.take_rows(&keep)
}

/// Numeric fill used by the `mean`/`median` strategies and the `auto` policy.
#[derive(Clone, Copy)]
enum NumericFill {
    Mean,
    Median,
}

impl NumericFill {
    fn compute(self, values: &[Value]) -> Option<f64> {
        match self {
            Self::Mean => mean(values),
            Self::Median => median(values),
        }
    }

    fn method(self) -> ImputeMethod {
        match self {
            Self::Mean => ImputeMethod::Mean,
            Self::Median => ImputeMethod::Median,
        }
    }
}

fn auto_impute(table: &Table, report: &mut CleanReport) -> Table {
    let rows = table.row_count();
    if rows == 0 {
        return table.clone();
    }

    let mut columns: Vec<Column> = Vec::with_capacity(table.column_count());
    for col in table.columns() {
        let missing = col.null_count();
        if missing == 0 {
            columns.push(col.clone());
            continue;
        }
        let fraction = missing as f64 / rows as f64;

        if fraction > 0.5 {
            report.dropped_columns.push(col.name.clone());
            continue;
        }

        if col.ctype == ColumnType::Numeric {
            let fill = if fraction > 0.3 {
                NumericFill::Median
            } else {
                NumericFill::Mean
            };
            columns.push(fill_numeric(col, fill, report));
        } else {
            columns.push(fill_mode(col, report));
        }
    }
    Table::from_columns(columns)
}

fn impute_all(table: &Table, report: &mut CleanReport, fill: NumericFill) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if col.null_count() == 0 {
                col.clone()
            } else if col.ctype == ColumnType::Numeric {
                fill_numeric(col, fill, report)
            } else {
                fill_mode(col, report)
            }
        })
        .collect();
    Table::from_columns(columns)
}

fn mode_impute_all(table: &Table, report: &mut CleanReport) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if col.null_count() == 0 {
                col.clone()
            } else {
                fill_mode(col, report)
            }
        })
        .collect();
    Table::from_columns(columns)
}

fn zero_impute_all(table: &Table, report: &mut CleanReport) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if col.null_count() == 0 {
                col.clone()
            } else if col.ctype == ColumnType::Numeric {
                let fill = if col.values.iter().all(|v| !matches!(v, Value::Float64(_))) {
                    Value::Int64(0)
                } else {
                    Value::Float64(0.0)
                };
                report.imputed.push(Imputation {
                    column: col.name.clone(),
                    method: ImputeMethod::Zero,
                });
                fill_with(col, fill)
            } else {
                report.imputed.push(Imputation {
                    column: col.name.clone(),
                    method: ImputeMethod::Placeholder,
                });
                fill_with(col, Value::Utf8("Unknown".to_string()))
            }
        })
        .collect();
    Table::from_columns(columns)
}

fn fill_numeric(col: &Column, fill: NumericFill, report: &mut CleanReport) -> Column {
    match fill.compute(&col.values) {
        Some(v) => {
            report.imputed.push(Imputation {
                column: col.name.clone(),
                method: fill.method(),
            });
            fill_with(col, Value::Float64(v))
        }
        // All-null numeric column with nothing to average; left as-is.
        None => col.clone(),
    }
}

fn fill_mode(col: &Column, report: &mut CleanReport) -> Column {
    match mode(&col.values) {
        Some(v) => {
            report.imputed.push(Imputation {
                column: col.name.clone(),
                method: ImputeMethod::Mode,
            });
            fill_with(col, v)
        }
        None => col.clone(),
    }
}

fn fill_with(col: &Column, fill: Value) -> Column {
    let values = col
        .values
        .iter()
        .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
        .collect();
    Column {
        name: col.name.clone(),
        ctype: col.ctype,
        values,
    }
}

fn mean(values: &[Value]) -> Option<f64> {
    let nums: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    if nums.is_empty() {
        return None;
    }
    Some(nums.iter().sum::<f64>() / nums.len() as f64)
}

fn median(values: &[Value]) -> Option<f64> {
    let mut nums: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    if nums.is_empty() {
        return None;
    }
    nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = nums.len() / 2;
    if nums.len() % 2 == 1 {
        Some(nums[mid])
    } else {
        Some((nums[mid - 1] + nums[mid]) / 2.0)
    }
}

/// Most frequent non-null value; ties broken by first occurrence in the
/// column's original order.
fn mode(values: &[Value]) -> Option<Value> {
    let mut counts: Vec<(&Value, usize)> = Vec::new();
    for v in values {
        if v.is_null() {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    // A strictly-greater comparison over first-occurrence-ordered counts keeps
    // the earliest value on ties (`max_by_key` would keep the last).
    let mut best: Option<(&Value, usize)> = None;
    for (v, n) in counts {
        if best.map_or(true, |(_, bn)| n > bn) {
            best = Some((v, n));
        }
    }
    best.map(|(v, _)| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_tokens_parse() {
        assert_eq!(
            "median".parse::<MissingStrategy>().unwrap(),
            MissingStrategy::Median
        );
        let err = "interpolate".parse::<MissingStrategy>().unwrap_err();
        assert!(err.to_string().contains("unknown missing-value strategy"));
    }

    #[test]
    fn mode_breaks_ties_by_first_occurrence() {
        let values = vec![
            Value::Utf8("b".to_string()),
            Value::Utf8("a".to_string()),
            Value::Utf8("a".to_string()),
            Value::Utf8("b".to_string()),
        ];
        assert_eq!(mode(&values), Some(Value::Utf8("b".to_string())));
    }

    #[test]
    fn median_of_even_count_averages_middles() {
        let values = vec![
            Value::Int64(1),
            Value::Int64(2),
            Value::Int64(3),
            Value::Int64(10),
        ];
        assert_eq!(median(&values), Some(2.5));
    }
}
