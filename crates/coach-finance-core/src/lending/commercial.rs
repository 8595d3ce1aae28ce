use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{self, AmortizationSchedule, LoanParameters, LoanResult};
use crate::error::CalcError;
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::CalcResult;

/// Coverage at or above which lenders generally view the debt as serviceable.
pub const DEFAULT_DSCR_THRESHOLD: Decimal = dec!(1.25);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for an income-producing property loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommercialMortgageInput {
    pub property_value: Money,
    /// Absolute down payment
    pub down_payment: Money,
    pub annual_rate_pct: Percent,
    pub term_years: Years,
    pub net_operating_income_annual: Money,
    /// Healthy-coverage threshold; 1.25x when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dscr_threshold: Option<Decimal>,
    #[serde(default)]
    pub include_schedule: bool,
}

/// Display classification of the coverage ratio. Never an error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DscrAssessment {
    Healthy,
    BelowThreshold,
    /// No debt service to cover
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommercialMortgageOutput {
    #[serde(flatten)]
    pub loan: LoanResult,
    pub annual_debt_service: Money,
    /// NOI / annual debt service; `None` when undefined
    pub dscr: Option<Decimal>,
    pub dscr_threshold: Decimal,
    pub dscr_assessment: DscrAssessment,
    /// Loan / property value as a percentage; `None` when undefined
    pub ltv_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<AmortizationSchedule>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Commercial mortgage payment with debt service coverage and leverage.
pub fn calculate_commercial_mortgage(
    input: &CommercialMortgageInput,
) -> CalcResult<ComputationOutput<CommercialMortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let principal = input.property_value - input.down_payment;
    let params = LoanParameters::new(principal, input.annual_rate_pct, input.term_years);
    let loan = amortization::summarize(&params)?;

    let annual_debt_service = loan
        .monthly_payment
        .checked_mul(Decimal::from(MONTHS_PER_YEAR))
        .ok_or_else(|| {
            CalcError::invalid(
                "property_value",
                "Annual debt service overflows the decimal range",
            )
        })?;
    let threshold = input.dscr_threshold.unwrap_or(DEFAULT_DSCR_THRESHOLD);
    let dscr = debt_service_coverage(input.net_operating_income_annual, loan.monthly_payment);
    let dscr_assessment = classify_dscr(dscr, threshold);
    let ltv_pct = loan_to_value_pct(principal, input.property_value);

    match (dscr_assessment, dscr) {
        (DscrAssessment::BelowThreshold, Some(ratio)) => warnings.push(format!(
            "DSCR of {ratio:.2}x is below {threshold:.2}x, a lender covenant risk"
        )),
        (DscrAssessment::Undefined, _) => warnings.push(
            "DSCR undefined: debt service is zero or the ratio is out of range".into(),
        ),
        _ => {}
    }
    if ltv_pct.is_none() {
        warnings.push("LTV undefined: property value is zero".into());
    }

    let schedule = if input.include_schedule {
        Some(amortization::amortize(&params)?)
    } else {
        None
    };

    let output = CommercialMortgageOutput {
        loan,
        annual_debt_service,
        dscr,
        dscr_threshold: threshold,
        dscr_assessment,
        ltv_pct,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Commercial mortgage (level payment, DSCR and LTV)",
        &serde_json::json!({
            "property_value": input.property_value.to_string(),
            "down_payment": input.down_payment.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "term_years": input.term_years.to_string(),
            "noi": input.net_operating_income_annual.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// NOI / (monthly payment * 12), `None` when there is no debt service or
/// the ratio is beyond the decimal range.
pub fn debt_service_coverage(noi_annual: Money, monthly_payment: Money) -> Option<Decimal> {
    let annual_debt_service = monthly_payment.checked_mul(Decimal::from(MONTHS_PER_YEAR))?;
    if annual_debt_service.is_zero() {
        None
    } else {
        noi_annual.checked_div(annual_debt_service)
    }
}

/// principal / property value * 100, `None` when the value is zero.
pub fn loan_to_value_pct(principal: Money, property_value: Money) -> Option<Percent> {
    if property_value.is_zero() {
        None
    } else {
        Some(principal / property_value * dec!(100))
    }
}

/// Healthy when the ratio is at or above the threshold.
pub fn classify_dscr(dscr: Option<Decimal>, threshold: Decimal) -> DscrAssessment {
    match dscr {
        Some(ratio) if ratio >= threshold => DscrAssessment::Healthy,
        Some(_) => DscrAssessment::BelowThreshold,
        None => DscrAssessment::Undefined,
    }
}

fn validate_input(input: &CommercialMortgageInput) -> CalcResult<()> {
    if input.property_value <= Decimal::ZERO {
        return Err(CalcError::invalid(
            "property_value",
            "Property value must be positive",
        ));
    }
    if input.down_payment < Decimal::ZERO || input.down_payment >= input.property_value {
        return Err(CalcError::invalid(
            "down_payment",
            "Down payment must be at least 0 and below the property value",
        ));
    }
    if input.net_operating_income_annual < Decimal::ZERO {
        return Err(CalcError::invalid(
            "net_operating_income_annual",
            "Net operating income cannot be negative",
        ));
    }
    if let Some(threshold) = input.dscr_threshold {
        if threshold <= Decimal::ZERO {
            return Err(CalcError::invalid(
                "dscr_threshold",
                "DSCR threshold must be positive",
            ));
        }
    }
    Ok(())
}
