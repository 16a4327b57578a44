use tabular_ingest::clean::{
    clean, clean_with_report, CleaningPolicy, ImputeMethod, MissingStrategy,
};
use tabular_ingest::ingest::delimited::{load_delimited_bytes, DelimitedOptions};
use tabular_ingest::table::{Table, Value};

fn num(v: i64) -> Value {
    Value::Int64(v)
}

fn text(s: &str) -> Value {
    Value::Utf8(s.to_string())
}

/// 10-row table exercising the auto thresholds:
/// - `sixty`: numeric, 6/10 null (dropped)
/// - `forty`: numeric, 4/10 null (median-imputed)
/// - `ten`: numeric, 1/10 null (mean-imputed)
/// - `label`: categorical, 2/10 null (mode-imputed)
fn threshold_table() -> Table {
    let sixty: Vec<Value> = vec![
        num(1),
        Value::Null,
        Value::Null,
        Value::Null,
        num(2),
        Value::Null,
        num(3),
        Value::Null,
        num(4),
        Value::Null,
    ];
    let forty: Vec<Value> = vec![
        num(1),
        num(2),
        Value::Null,
        num(3),
        Value::Null,
        num(4),
        Value::Null,
        num(5),
        Value::Null,
        num(100),
    ];
    let ten: Vec<Value> = vec![
        num(1),
        num(2),
        num(3),
        num(4),
        num(5),
        num(6),
        num(7),
        num(8),
        num(9),
        Value::Null,
    ];
    let label: Vec<Value> = vec![
        text("x"),
        text("y"),
        text("x"),
        Value::Null,
        text("x"),
        text("y"),
        text("x"),
        Value::Null,
        text("y"),
        text("x"),
    ];
    Table::from_rows(
        vec![
            "sixty".to_string(),
            "forty".to_string(),
            "ten".to_string(),
            "label".to_string(),
        ],
        (0..10)
            .map(|i| {
                vec![
                    sixty[i].clone(),
                    forty[i].clone(),
                    ten[i].clone(),
                    label[i].clone(),
                ]
            })
            .collect(),
    )
}

#[test]
fn auto_applies_per_column_thresholds() {
    let table = threshold_table();
    let policy = CleaningPolicy {
        handle_duplicates: false,
        ..Default::default()
    };
    let (cleaned, report) = clean_with_report(&table, &policy);

    // 60% missing: dropped entirely.
    assert!(cleaned.column("sixty").is_none());
    assert_eq!(report.dropped_columns, vec!["sixty".to_string()]);

    // 40% missing: imputed with the median of [1,2,3,4,5,100] = 3.5.
    let forty = cleaned.column("forty").unwrap();
    assert_eq!(forty.values[2], Value::Float64(3.5));
    assert_eq!(forty.values[0], Value::Int64(1));

    // 10% missing: imputed with the mean of 1..=9 = 5.0.
    let ten = cleaned.column("ten").unwrap();
    assert_eq!(ten.values[9], Value::Float64(5.0));

    // Categorical below threshold: mode ("x" occurs most).
    let label = cleaned.column("label").unwrap();
    assert_eq!(label.values[3], text("x"));

    assert_eq!(cleaned.row_count(), 10);
    assert!(report
        .imputed
        .iter()
        .any(|i| i.column == "forty" && i.method == ImputeMethod::Median));
    assert!(report
        .imputed
        .iter()
        .any(|i| i.column == "ten" && i.method == ImputeMethod::Mean));
}

#[test]
fn mean_strategy_never_drops_columns() {
    let table = threshold_table();
    let policy = CleaningPolicy {
        handle_duplicates: false,
        missing_strategy: MissingStrategy::Mean,
        ..Default::default()
    };
    let cleaned = clean(&table, &policy);

    // Even at 60% missing the column survives, mean-imputed with (1+2+3+4)/4.
    let sixty = cleaned.column("sixty").unwrap();
    assert_eq!(sixty.values[1], Value::Float64(2.5));
}

#[test]
fn drop_strategy_removes_exactly_the_null_rows() {
    let input = b"a,b\n1,2\n3,\n5,6\n,8\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();
    let policy = CleaningPolicy {
        handle_duplicates: false,
        missing_strategy: MissingStrategy::Drop,
        ..Default::default()
    };
    let (cleaned, report) = clean_with_report(&table, &policy);

    assert_eq!(cleaned.row_count(), 2);
    assert_eq!(report.rows_dropped, 2);
    assert_eq!(cleaned.column("a").unwrap().values, vec![num(1), num(5)]);
}

#[test]
fn dedup_keeps_first_occurrence_and_is_idempotent() {
    let input = b"a,b\n1,2\n3,4\n1,2\n1,2\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();
    let policy = CleaningPolicy {
        handle_missing: false,
        ..Default::default()
    };

    let (once, report) = clean_with_report(&table, &policy);
    assert_eq!(once.row_count(), 2);
    assert_eq!(report.duplicates_removed, 2);
    assert_eq!(once.column("a").unwrap().values, vec![num(1), num(3)]);

    let twice = clean(&once, &policy);
    assert_eq!(twice.row_count(), once.row_count());
}

#[test]
fn duplicates_then_missing_drop_can_empty_the_table() {
    // Two "1," rows collapse to one, then both remaining rows carry a null
    // and are dropped: 0 rows, 2 columns.
    let input = b"a,b\n1,\n,2\n1,\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();
    let policy = CleaningPolicy {
        handle_missing: true,
        handle_duplicates: true,
        missing_strategy: MissingStrategy::Drop,
    };
    let cleaned = clean(&table, &policy);

    assert_eq!(cleaned.row_count(), 0);
    assert_eq!(cleaned.column_names(), vec!["a", "b"]);
}

#[test]
fn mode_strategy_fills_every_column() {
    let input = b"a,b\n1,x\n1,\n,x\n2,y\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();
    let policy = CleaningPolicy {
        handle_duplicates: false,
        missing_strategy: MissingStrategy::Mode,
        ..Default::default()
    };
    let cleaned = clean(&table, &policy);

    assert_eq!(cleaned.column("a").unwrap().values[2], num(1));
    assert_eq!(cleaned.column("b").unwrap().values[1], text("x"));
}

#[test]
fn zero_strategy_uses_zero_and_placeholder() {
    let input = b"count,ratio,label\n1,0.5,x\n,,\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();
    let policy = CleaningPolicy {
        handle_duplicates: false,
        missing_strategy: MissingStrategy::Zero,
        ..Default::default()
    };
    let cleaned = clean(&table, &policy);

    assert_eq!(cleaned.column("count").unwrap().values[1], Value::Int64(0));
    assert_eq!(cleaned.column("ratio").unwrap().values[1], Value::Float64(0.0));
    assert_eq!(cleaned.column("label").unwrap().values[1], text("Unknown"));
}

#[test]
fn clean_never_mutates_its_input() {
    let input = b"a,b\n1,\n1,\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();
    let before = table.clone();

    let _ = clean(&table, &CleaningPolicy::default());
    assert_eq!(table, before);
}

#[test]
fn unknown_strategy_token_fails_fast() {
    let err = CleaningPolicy::from_token(true, true, "interpolate").unwrap_err();
    assert!(err
        .to_string()
        .contains("unknown missing-value strategy 'interpolate'"));
}

#[test]
fn cleaning_an_empty_table_is_a_no_op() {
    let cleaned = clean(&Table::empty(), &CleaningPolicy::default());
    assert!(cleaned.is_empty());
}
