use napi::Result as NapiResult;
use napi_derive::napi;

use calckit_core::investment::{lump_sum, sip};
use calckit_core::loan::{self, EventBook, LoanInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let events = EventBook::from_rows(&input.events).map_err(to_napi_error)?;
    let output = loan::generate_schedule(&input.parameters, &events).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn loan_breakdown(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Blank event table rows for a fresh loan form, up to the simulation cap.
#[napi]
pub fn loan_event_template(tenure_months: u32) -> NapiResult<String> {
    let rows = EventBook::blank_rows(tenure_months).map_err(to_napi_error)?;
    serde_json::to_string(&rows).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

#[napi]
pub fn project_sip(input_json: String) -> NapiResult<String> {
    let input: sip::SipInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sip::project_sip(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_lump_sum(input_json: String) -> NapiResult<String> {
    let input: lump_sum::LumpSumInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lump_sum::project_lump_sum(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
