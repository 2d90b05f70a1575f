//! End-to-end flow: decode an upload, clean and infer, coerce types,
//! persist, and load the active dataset back.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tabulado::prelude::*;

#[test]
fn semicolon_csv_with_latin_numbers_end_to_end() {
    let upload = Upload::new(
        "ventas enero.csv",
        &b"Nombre;Valor\nAna;1.500,25\nLuis;2.000,00"[..],
    );

    let outcome = read_upload(&upload, &ReadOptions::default()).unwrap();
    assert_eq!(outcome.delimiter, Some(b';'));
    assert_eq!(outcome.encoding, Some("utf-8"));
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.table.column_names(), vec!["Nombre", "Valor"]);

    // Latin-formatted numbers survive inference untouched (they are not
    // plain f64s) and convert on explicit coercion.
    let table = process(&outcome.table, &ProcessOptions::default());
    assert_eq!(table.cell(0, "Valor"), Some(&CellValue::Text("1.500,25".into())));
    let table = coerce(&table, "Valor", ColumnType::Numeric);
    assert_eq!(table.cell(0, "Valor"), Some(&CellValue::Number(1500.25)));
    assert_eq!(table.cell(1, "Valor"), Some(&CellValue::Number(2000.0)));

    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("datos"));
    let receipt = store
        .save(&table, &upload.name, serde_json::json!({"ext": ".csv"}))
        .unwrap();
    assert!(receipt.filename.starts_with("dataset_ventas_enero_"));

    let loaded = store.load_active().unwrap();
    assert_eq!(loaded.n_rows(), table.n_rows());
    assert_eq!(loaded.column_names(), table.column_names());
    assert_eq!(loaded, table);
}

#[test]
fn messy_upload_is_cleaned_and_typed() {
    // Duplicate and blank headers, an all-blank line, Spanish dates and
    // currency amounts.
    let raw = b"fecha;;importe;importe\n11-ene-2002;x;$1.234,50;a\n;;;\n2002-01-11;y;$2,00;b";
    let upload = Upload::new("caja.csv", &raw[..]);
    let outcome = read_upload(&upload, &ReadOptions::default()).unwrap();

    let table = process(&outcome.table, &ProcessOptions::default());
    assert_eq!(
        table.column_names(),
        vec!["fecha", "col_2", "importe", "importe_2"]
    );
    assert_eq!(table.n_rows(), 2);

    let mut types = TypeMap::new();
    types.set("fecha", ColumnType::Date);
    types.set("importe", ColumnType::Currency);
    let table = types.apply(&table);

    let day = NaiveDate::from_ymd_opt(2002, 1, 11).unwrap();
    assert_eq!(table.cell(0, "fecha"), Some(&CellValue::Date(day)));
    assert_eq!(table.cell(1, "fecha"), Some(&CellValue::Date(day)));
    assert_eq!(table.cell(0, "importe"), Some(&CellValue::Number(1234.5)));
    assert_eq!(table.cell(1, "importe"), Some(&CellValue::Number(2.0)));
}

#[test]
fn numeric_inference_threshold_behaviour() {
    let raw = b"v\n1\n2\nx\n4";
    let upload = Upload::new("datos.txt", &raw[..]);
    let outcome = read_upload(&upload, &ReadOptions::default()).unwrap();

    let promoted = process(
        &outcome.table,
        &ProcessOptions {
            threshold: 0.70,
            ..ProcessOptions::default()
        },
    );
    assert_eq!(promoted.cell(0, "v"), Some(&CellValue::Number(1.0)));
    assert_eq!(promoted.cell(2, "v"), Some(&CellValue::Null));

    let kept = process(
        &outcome.table,
        &ProcessOptions {
            threshold: 0.80,
            ..ProcessOptions::default()
        },
    );
    assert_eq!(kept.cell(2, "v"), Some(&CellValue::Text("x".into())));
}

#[test]
fn no_active_dataset_on_a_fresh_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("nada"));
    assert!(store.pointer().is_none());
    assert!(store.load_active().is_none());
}
