//! Event table import: `month,prepayment,topup,new_rate`, one row per month,
//! empty cell meaning "no event". This is the same layout that
//! `calckit loan-template --output csv` prints.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

use calckit_core::loan::EventRow;

use crate::input::file::resolve_path;

/// Raw CSV record. Amount cells stay as text so they go straight to
/// `Decimal` without a float detour.
#[derive(Debug, Deserialize)]
struct EventRecord {
    month: u32,
    #[serde(default)]
    prepayment: Option<String>,
    #[serde(default)]
    topup: Option<String>,
    #[serde(default)]
    new_rate: Option<String>,
}

/// Read an event table from a CSV file.
pub fn read_events_csv(path: &str) -> Result<Vec<EventRow>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_events_csv(file)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

/// Parse an event table. Rows with every amount cell empty are kept as blank
/// rows; the event book drops them.
pub fn parse_events_csv<R: Read>(reader: R) -> Result<Vec<EventRow>, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let record: EventRecord = record?;
        rows.push(EventRow {
            month: record.month,
            prepayment: parse_cell(record.month, "prepayment", record.prepayment)?,
            topup: parse_cell(record.month, "topup", record.topup)?,
            new_rate: parse_cell(record.month, "new_rate", record.new_rate)?,
        });
    }
    Ok(rows)
}

fn parse_cell(
    month: u32,
    column: &str,
    cell: Option<String>,
) -> Result<Option<Decimal>, Box<dyn std::error::Error>> {
    match cell.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Decimal::from_str(text)
            .map(Some)
            .map_err(|e| format!("month {month}: invalid {column} '{text}': {e}").into()),
    }
}
