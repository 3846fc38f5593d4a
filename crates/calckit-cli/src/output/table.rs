use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten, format_scalar, ordered_columns, record_cells, result_object};

/// Format output as tables using the tabled crate: a field/value table for the
/// scalar results, then one table per record array (schedule rows, yearly
/// breakdown, event template).
pub fn print_table(value: &Value, precision: u32) {
    println!("{}", render_table(value, precision));
}

pub fn render_table(value: &Value, precision: u32) -> String {
    let Some(result) = result_object(value) else {
        return format_scalar(value, precision);
    };

    let flat = flatten(result);
    let mut sections = Vec::new();

    if !flat.fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &flat.fields {
            builder.push_record([key.clone(), format_scalar(val, precision)]);
        }
        sections.push(Table::from(builder).to_string());
    }

    for (name, records) in &flat.tables {
        let columns = ordered_columns(records);
        let mut builder = Builder::default();
        builder.push_record(columns.iter().map(|c| column_label(c)));
        for record in records.iter() {
            builder.push_record(record_cells(record, &columns, precision));
        }
        sections.push(format!("{}:\n{}", name, Table::from(builder)));
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            let lines: Vec<String> = warnings
                .iter()
                .filter_map(|w| w.as_str())
                .map(|w| format!("  - {}", w))
                .collect();
            sections.push(format!("Warnings:\n{}", lines.join("\n")));
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        sections.push(format!("Methodology: {}", meth));
    }

    sections.join("\n\n")
}

fn column_label(key: &str) -> String {
    match key {
        "month" => "Month",
        "payment_date" => "Date",
        "installment" => "Installment",
        "principal_component" => "Principal",
        "interest_component" => "Interest",
        "prepayment" => "Prepayment",
        "topup" => "Top-up",
        "new_rate" => "New rate %",
        "effective_annual_rate" => "Rate %",
        "outstanding_balance" => "Balance",
        "is_closing" => "Closing",
        "months_elapsed" => "Months",
        "year" => "Year",
        "invested" => "Invested",
        "returns" => "Returns",
        "value" => "Value",
        other => other,
    }
    .to_string()
}
