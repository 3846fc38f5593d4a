pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::OutputFormat;

/// Column order for record tables; keys not listed follow in map order.
const COLUMN_ORDER: &[&str] = &[
    "month",
    "year",
    "months_elapsed",
    "payment_date",
    "installment",
    "principal_component",
    "interest_component",
    "prepayment",
    "topup",
    "new_rate",
    "effective_annual_rate",
    "outstanding_balance",
    "invested",
    "returns",
    "value",
    "is_closing",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: OutputFormat, precision: u32, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value, precision),
        OutputFormat::Csv => csv_out::print_csv(value, precision),
        OutputFormat::Minimal => minimal::print_minimal(value, precision),
    }
}

/// Render a scalar for text output. Decimal strings are rounded to
/// `precision` places; everything else is printed as is.
pub fn format_scalar(value: &Value, precision: u32) -> String {
    match value {
        Value::String(s) => match Decimal::from_str(s) {
            Ok(d) => format!("{:.*}", precision as usize, d.round_dp(precision)),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr
            .iter()
            .map(|v| format_scalar(v, precision))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// A flattened result: dotted scalar fields plus every array of objects
/// found along the way (schedule rows, yearly breakdowns, event tables).
#[derive(Debug, Default)]
pub struct Flattened<'a> {
    pub fields: Vec<(String, &'a Value)>,
    pub tables: Vec<(String, &'a [Value])>,
}

pub fn flatten(map: &Map<String, Value>) -> Flattened<'_> {
    let mut out = Flattened::default();
    flatten_into("", map, &mut out);
    out
}

fn flatten_into<'a>(prefix: &str, map: &'a Map<String, Value>, out: &mut Flattened<'a>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten_into(&path, inner, out),
            Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))) => {
                out.tables.push((path, arr.as_slice()));
            }
            _ => out.fields.push((path, val)),
        }
    }
}

/// The `result` object of an output envelope, or the value itself.
pub fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    match value.get("result") {
        Some(Value::Object(result)) => Some(result),
        _ => value.as_object(),
    }
}

/// Column keys of a record table, taken from its first row.
pub fn ordered_columns(records: &[Value]) -> Vec<String> {
    let Some(Value::Object(first)) = records.first() else {
        return Vec::new();
    };
    let mut columns: Vec<String> = first.keys().cloned().collect();
    columns.sort_by_key(|c| {
        COLUMN_ORDER
            .iter()
            .position(|known| *known == c.as_str())
            .unwrap_or(COLUMN_ORDER.len())
    });
    columns
}

/// Render one record as cells in `columns` order.
pub fn record_cells(record: &Value, columns: &[String], precision: u32) -> Vec<String> {
    columns
        .iter()
        .map(|c| {
            record
                .get(c.as_str())
                .map(|v| format_scalar(v, precision))
                .unwrap_or_default()
        })
        .collect()
}
