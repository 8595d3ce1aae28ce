use napi::Result as NapiResult;
use napi_derive::napi;

use coach_finance_core::amortization::{self, LoanParameters};
use coach_finance_core::investment::growth::{self, InvestmentInput};
use coach_finance_core::lending::commercial::{self, CommercialMortgageInput};
use coach_finance_core::lending::loan::{self, LoanInput};
use coach_finance_core::lending::mortgage::{self, MortgageInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Lending
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_loan(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan::calculate_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_mortgage(input_json: String) -> NapiResult<String> {
    let input: MortgageInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = mortgage::calculate_mortgage(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_commercial_mortgage(input_json: String) -> NapiResult<String> {
    let input: CommercialMortgageInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = commercial::calculate_commercial_mortgage(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_amortization_schedule(input_json: String) -> NapiResult<String> {
    let params: LoanParameters = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::build_amortization(&params).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_investment(input_json: String) -> NapiResult<String> {
    let input: InvestmentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = growth::calculate_investment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
