use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::time_value::{self, MONTHS_PER_YEAR};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate, Years};
use crate::CalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionFrequency {
    #[default]
    Monthly,
    /// Spread evenly as one twelfth per month
    Yearly,
}

/// Input for compound growth with regular contributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentInput {
    pub initial_principal: Money,
    #[serde(default)]
    pub contribution: Money,
    #[serde(default)]
    pub frequency: ContributionFrequency,
    pub annual_rate_pct: Percent,
    pub term_years: Years,
    /// Attach a year-by-year growth table
    #[serde(default)]
    pub include_yearly: bool,
}

/// Position of the investment at the end of a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentYear {
    pub year: u32,
    pub balance: Money,
    pub contributions_to_date: Money,
    pub earnings_to_date: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub future_value: Money,
    pub total_contributions: Money,
    pub total_earnings: Money,
    pub monthly_contribution: Money,
    pub periods: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly: Option<Vec<InvestmentYear>>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Future value of an initial sum plus monthly contributions, compounded monthly.
///
/// FV = P(1+r)^n + c((1+r)^n - 1)/r, or P + c*n at a zero rate.
pub fn calculate_investment(
    input: &InvestmentInput,
) -> CalcResult<ComputationOutput<InvestmentResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let rate = time_value::monthly_rate(input.annual_rate_pct)?;
    let periods = time_value::month_count(input.term_years)?;
    let monthly_contribution = monthly_contribution(input.contribution, input.frequency);

    let position = position_after(input.initial_principal, monthly_contribution, rate, periods)?;

    if rate.is_zero() {
        warnings.push("Zero growth rate: future value equals total contributions".into());
    }

    let yearly = if input.include_yearly {
        Some(yearly_growth(
            input.initial_principal,
            monthly_contribution,
            rate,
            periods,
        )?)
    } else {
        None
    };

    tracing::debug!(
        periods,
        future_value = %position.balance,
        "investment projected"
    );

    let output = InvestmentResult {
        future_value: position.balance,
        total_contributions: position.contributions_to_date,
        total_earnings: position.earnings_to_date,
        monthly_contribution,
        periods,
        yearly,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Compound growth with monthly contributions",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Contribution expressed per month.
pub fn monthly_contribution(contribution: Money, frequency: ContributionFrequency) -> Money {
    match frequency {
        ContributionFrequency::Monthly => contribution,
        ContributionFrequency::Yearly => contribution / Decimal::from(MONTHS_PER_YEAR),
    }
}

fn position_after(
    principal: Money,
    monthly_contribution: Money,
    rate: Rate,
    months: u32,
) -> CalcResult<InvestmentYear> {
    let balance = time_value::future_value(rate, months, principal, monthly_contribution)?;
    let contributions = principal + monthly_contribution * Decimal::from(months);

    Ok(InvestmentYear {
        year: months.div_ceil(MONTHS_PER_YEAR),
        balance,
        contributions_to_date: contributions,
        earnings_to_date: balance - contributions,
    })
}

/// End-of-year positions; a partial final year ends at the last period.
fn yearly_growth(
    principal: Money,
    monthly_contribution: Money,
    rate: Rate,
    periods: u32,
) -> CalcResult<Vec<InvestmentYear>> {
    let years = periods.div_ceil(MONTHS_PER_YEAR);
    (1..=years)
        .map(|year| {
            let months = (year * MONTHS_PER_YEAR).min(periods);
            position_after(principal, monthly_contribution, rate, months)
        })
        .collect()
}

fn validate_input(input: &InvestmentInput) -> CalcResult<()> {
    let fields = [
        ("initial_principal", input.initial_principal),
        ("contribution", input.contribution),
    ];
    for (field, value) in fields {
        if value < Decimal::ZERO {
            return Err(CalcError::invalid(field, "Amount cannot be negative"));
        }
    }
    Ok(())
}
