//! JSON and JSON-Lines decoding into a table.
//!
//! JSON uploads come in many shapes. The strategies here are tried in
//! order: JSON Lines (one record per line), then a single document. A
//! single document is then normalized by shape: an array of objects
//! becomes one row per object with nested keys flattened to dotted
//! column names, an array of scalars becomes a `value` column, and an
//! object wrapping a list of records gets the wrapping key recorded in a
//! leading `_source_key` column.

use serde_json::Value;
use tabulado_core::{CellValue, Table};

use crate::error::{FormatError, Result};

pub fn read_json(raw: &[u8]) -> Result<Table> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.is_empty() {
        return Err(FormatError::Empty);
    }

    // JSON Lines: every non-blank line is its own document.
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() > 1 {
        let parsed: Option<Vec<Value>> =
            lines.iter().map(|l| serde_json::from_str(l).ok()).collect();
        if let Some(values) = parsed {
            return normalize_array(values);
        }
    }

    let doc: Value = serde_json::from_str(text)?;
    match doc {
        Value::Array(values) => normalize_array(values),
        Value::Object(map) => {
            // An object wrapping exactly the records we want, e.g.
            // {"resultados": [{...}, {...}]}: unwrap the first such key
            // and keep its name so the origin is not lost.
            for (key, value) in &map {
                if let Value::Array(items) = value {
                    if !items.is_empty() && items.iter().all(Value::is_object) {
                        return normalize_objects(items.clone(), Some(key.clone()));
                    }
                }
            }
            normalize_objects(vec![Value::Object(map)], None)
        }
        scalar => Ok(value_column(vec![scalar])),
    }
}

fn normalize_array(values: Vec<Value>) -> Result<Table> {
    if values.is_empty() {
        return Ok(Table::new());
    }
    if values.iter().all(Value::is_object) {
        normalize_objects(values, None)
    } else {
        Ok(value_column(values))
    }
}

/// One row per object, nested objects flattened to `parent.child` names.
/// Column order is first-seen across the records; records missing a key
/// get a null there.
fn normalize_objects(records: Vec<Value>, source_key: Option<String>) -> Result<Table> {
    let mut names: Vec<String> = Vec::new();
    let mut flat_rows: Vec<Vec<(String, CellValue)>> = Vec::with_capacity(records.len());
    for record in &records {
        let mut flat = Vec::new();
        flatten(record, "", &mut flat);
        for (name, _) in &flat {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
        flat_rows.push(flat);
    }

    let rows: Vec<Vec<CellValue>> = flat_rows
        .into_iter()
        .map(|flat| {
            names
                .iter()
                .map(|name| {
                    flat.iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, v)| v.clone())
                        .unwrap_or(CellValue::Null)
                })
                .collect()
        })
        .collect();

    let mut table = Table::from_rows(names, rows);
    if let Some(key) = source_key {
        let cells = vec![CellValue::Text(key); table.n_rows()];
        table.insert_column(0, tabulado_core::Column::new("_source_key", cells))?;
    }
    Ok(table)
}

fn flatten(value: &Value, prefix: &str, out: &mut Vec<(String, CellValue)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(nested, &name, out);
            }
        }
        leaf => out.push((prefix.to_string(), scalar_to_cell(leaf))),
    }
}

fn value_column(values: Vec<Value>) -> Table {
    let cells = values.iter().map(scalar_to_cell).collect();
    Table::from_columns(vec![tabulado_core::Column::new("value", cells)])
        .unwrap_or_else(|_| Table::new())
}

fn scalar_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Number(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => match n.as_f64() {
            Some(f) => CellValue::Number(f),
            None => CellValue::Text(n.to_string()),
        },
        Value::String(s) => {
            if s.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(s.clone())
            }
        }
        // Arrays nested inside a record stay as their JSON text.
        other => CellValue::Text(other.to_string()),
    }
}
