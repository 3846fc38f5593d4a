use serde_json::Value;

use super::{format_scalar, result_object};

/// Headline fields, in order of priority.
const PRIORITY_KEYS: &[&str] = &["maturity_value", "final_value", "original_installment"];

/// Print just the key answer from the output.
pub fn print_minimal(value: &Value, precision: u32) {
    for line in minimal_lines(value, precision) {
        println!("{}", line);
    }
}

/// Loan runs give total principal and total interest from the breakdown;
/// projections give their headline value; anything else falls back to the
/// first field of the result.
pub fn minimal_lines(value: &Value, precision: u32) -> Vec<String> {
    let Some(result) = result_object(value) else {
        return vec![format_scalar(value, precision)];
    };

    if let Some(Value::Object(breakdown)) = result.get("breakdown") {
        return ["total_principal", "total_interest"]
            .iter()
            .filter_map(|key| {
                breakdown
                    .get(*key)
                    .map(|v| format!("{}: {}", key, format_scalar(v, precision)))
            })
            .collect();
    }

    for key in PRIORITY_KEYS {
        if let Some(val) = result.get(*key) {
            if !val.is_null() {
                return vec![format_scalar(val, precision)];
            }
        }
    }

    result
        .iter()
        .next()
        .map(|(key, val)| vec![format!("{}: {}", key, format_scalar(val, precision))])
        .unwrap_or_default()
}
