use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tabular_ingest::ingest::delimited::{load_delimited_bytes, DelimitedOptions};
use tabular_ingest::ingest::{load, LoadOptions};
use tabular_ingest::table::{ColumnType, Value};

fn tmp_file(name: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabular-ingest-{name}-{nanos}.{ext}"))
}

#[test]
fn loads_all_rows_and_columns_in_order() {
    let input = b"date,sales,expenses\n2023-01-01,1000,700\n2023-02-01,1200,750\n2023-03-01,1100,800\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column_names(), vec!["date", "sales", "expenses"]);
    assert_eq!(table.column("date").unwrap().ctype, ColumnType::DatetimeCandidate);
    assert_eq!(table.column("sales").unwrap().ctype, ColumnType::Numeric);
    assert_eq!(table.column("sales").unwrap().values[1], Value::Int64(1200));
}

#[test]
fn round_trips_field_values() {
    let input = b"name,score\nAda,98.5\nGrace,87.25\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();

    assert_eq!(
        table.column("name").unwrap().values,
        vec![
            Value::Utf8("Ada".to_string()),
            Value::Utf8("Grace".to_string())
        ]
    );
    assert_eq!(
        table.column("score").unwrap().values,
        vec![Value::Float64(98.5), Value::Float64(87.25)]
    );
}

#[test]
fn ragged_rows_are_padded_and_truncated() {
    // Lenient contract: short rows are right-padded with nulls, long rows
    // truncated to the header width.
    let input = b"a,b,c\n1,2\n4,5,6,7\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();

    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_count(), 3);
    assert_eq!(table.column("c").unwrap().values[0], Value::Null);
    assert_eq!(table.column("c").unwrap().values[1], Value::Int64(6));
}

#[test]
fn empty_cells_become_nulls() {
    let input = b"a,b\n1,\n,2\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();

    assert_eq!(table.column("b").unwrap().values[0], Value::Null);
    assert_eq!(table.column("a").unwrap().values[1], Value::Null);
}

#[test]
fn header_only_input_keeps_column_names() {
    let input = b"a,b,c\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();

    assert_eq!(table.row_count(), 0);
    assert_eq!(table.column_names(), vec!["a", "b", "c"]);
}

#[test]
fn empty_input_is_the_empty_table() {
    let table = load_delimited_bytes(b"", "<test>", &DelimitedOptions::default()).unwrap();
    assert!(table.is_empty());
}

#[test]
fn tsv_extension_selects_tab_delimiter() {
    let path = tmp_file("people", "tsv");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"id\tname\n1\tAda\n").unwrap();
    drop(f);

    let table = load(path.as_path(), &LoadOptions::default()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(table.column_names(), vec!["id", "name"]);
    assert_eq!(table.column("name").unwrap().values[0], Value::Utf8("Ada".to_string()));
}

#[test]
fn decodes_configured_encoding() {
    // "José" in windows-1252.
    let input = b"name\nJos\xe9\n";
    let opts = DelimitedOptions {
        encoding: "windows-1252".to_string(),
        ..Default::default()
    };
    let table = load_delimited_bytes(input, "<test>", &opts).unwrap();
    assert_eq!(
        table.column("name").unwrap().values[0],
        Value::Utf8("José".to_string())
    );
}

#[test]
fn unknown_encoding_label_is_a_parse_error() {
    let opts = DelimitedOptions {
        encoding: "not-a-charset".to_string(),
        ..Default::default()
    };
    let err = load_delimited_bytes(b"a\n1\n", "<test>", &opts).unwrap_err();
    assert!(err.to_string().contains("unknown encoding label"));
}

#[test]
fn duplicate_headers_are_disambiguated() {
    let input = b"x,x\n1,2\n";
    let table = load_delimited_bytes(input, "<test>", &DelimitedOptions::default()).unwrap();
    assert_eq!(table.column_names(), vec!["x", "x.1"]);
}
