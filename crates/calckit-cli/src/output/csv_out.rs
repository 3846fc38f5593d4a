use serde_json::Value;
use std::io::{self, Write};

use super::{flatten, format_scalar, ordered_columns, record_cells, result_object};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value, precision: u32) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value, precision) {
        eprintln!("CSV write error: {}", e);
    }
}

/// The first record array in the result (schedule rows, yearly breakdown,
/// event template) is written with raw keys as headers. Results without one
/// fall back to a two-column `field,value` listing.
pub fn write_csv<W: Write>(writer: W, value: &Value, precision: u32) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    match result_object(value) {
        Some(result) => {
            let flat = flatten(result);
            if let Some((_, records)) = flat.tables.first() {
                let columns = ordered_columns(records);
                wtr.write_record(&columns)?;
                for record in records.iter() {
                    wtr.write_record(record_cells(record, &columns, precision))?;
                }
            } else {
                wtr.write_record(["field", "value"])?;
                for (key, val) in &flat.fields {
                    wtr.write_record([key.clone(), format_scalar(val, precision)])?;
                }
            }
        }
        None => wtr.write_record([format_scalar(value, precision)])?,
    }

    wtr.flush()?;
    Ok(())
}
