use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{self, AmortizationSchedule, LoanParameters};
use crate::error::CalcError;
use crate::time_value::MONTHS_PER_YEAR;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::CalcResult;

/// Down payments below this share of the price usually carry PMI.
const PMI_FREE_DOWN_PCT: Decimal = dec!(20);

/// Loan-to-value above which a warning is attached.
const HIGH_LTV_PCT: Decimal = dec!(95);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two mutually exclusive ways of entering a down payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownPayment {
    /// Share of the home price, 20 = 20%
    Percent(Percent),
    /// Absolute amount
    Amount(Money),
}

/// Input parameters for a residential mortgage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageInput {
    pub home_price: Money,
    pub down_payment: DownPayment,
    pub annual_rate_pct: Percent,
    pub term_years: Years,
    #[serde(default)]
    pub property_tax_annual: Money,
    #[serde(default)]
    pub home_insurance_annual: Money,
    /// HOA or property management fee
    #[serde(default)]
    pub management_monthly: Money,
    /// Private mortgage insurance
    #[serde(default)]
    pub pmi_monthly: Money,
    #[serde(default)]
    pub include_schedule: bool,
}

/// Recurring monthly costs that sit on top of principal and interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyExpenses {
    pub property_tax: Money,
    pub home_insurance: Money,
    pub management: Money,
    pub pmi: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageOutput {
    pub loan_amount: Money,
    pub down_payment_amount: Money,
    pub down_payment_pct: Percent,
    pub loan_to_value_pct: Percent,
    /// Principal and interest only
    pub principal_and_interest: Money,
    pub additional_expenses: MonthlyExpenses,
    pub total_monthly_payment: Money,
    /// Principal and interest over the full term
    pub total_payment: Money,
    pub total_interest: Money,
    pub periods: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<AmortizationSchedule>,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Monthly mortgage cost split into the amortised loan payment and the
/// recurring expenses that are paid alongside it.
///
/// Only `home_price - down_payment` goes through the amortisation engine;
/// taxes, insurance, management and PMI are flat monthly add-ons.
pub fn calculate_mortgage(input: &MortgageInput) -> CalcResult<ComputationOutput<MortgageOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let down_payment_amount = resolve_down_payment(input.home_price, input.down_payment)?;
    let loan_amount = input.home_price - down_payment_amount;
    let down_payment_pct = down_payment_amount / input.home_price * dec!(100);
    let loan_to_value_pct = loan_amount / input.home_price * dec!(100);

    let params = LoanParameters::new(loan_amount, input.annual_rate_pct, input.term_years);
    let summary = amortization::summarize(&params)?;
    let additional_expenses = monthly_expenses(input)?;

    if down_payment_pct < PMI_FREE_DOWN_PCT && input.pmi_monthly.is_zero() {
        warnings.push(format!(
            "Down payment of {:.1}% is below {}%; lenders usually require PMI",
            down_payment_pct, PMI_FREE_DOWN_PCT
        ));
    }
    if loan_to_value_pct > HIGH_LTV_PCT {
        warnings.push(format!(
            "LTV of {:.1}% exceeds {}%, which is high leverage",
            loan_to_value_pct, HIGH_LTV_PCT
        ));
    }

    let schedule = if input.include_schedule {
        Some(amortization::amortize(&params)?)
    } else {
        None
    };

    let output = MortgageOutput {
        loan_amount,
        down_payment_amount,
        down_payment_pct,
        loan_to_value_pct,
        principal_and_interest: summary.monthly_payment,
        total_monthly_payment: summary
            .monthly_payment
            .checked_add(additional_expenses.total)
            .ok_or_else(|| out_of_range("home_price"))?,
        additional_expenses,
        total_payment: summary.total_payment,
        total_interest: summary.total_interest,
        periods: summary.periods,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Residential mortgage (P&I amortised, expenses added monthly)",
        &serde_json::json!({
            "home_price": input.home_price.to_string(),
            "down_payment": input.down_payment,
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "term_years": input.term_years.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Down payment as an absolute amount, whichever mode it was entered in.
pub fn resolve_down_payment(home_price: Money, down_payment: DownPayment) -> CalcResult<Money> {
    match down_payment {
        DownPayment::Percent(pct) => {
            if pct < Decimal::ZERO || pct > dec!(100) {
                return Err(CalcError::invalid(
                    "down_payment",
                    "Down payment percent must be between 0 and 100",
                ));
            }
            home_price
                .checked_mul(pct)
                .map(|scaled| scaled / dec!(100))
                .ok_or_else(|| out_of_range("home_price"))
        }
        DownPayment::Amount(amount) => {
            if amount < Decimal::ZERO || amount > home_price {
                return Err(CalcError::invalid(
                    "down_payment",
                    "Down payment must be between 0 and the home price",
                ));
            }
            Ok(amount)
        }
    }
}

/// property_tax/12 + insurance/12 + management + pmi
pub fn monthly_expenses(input: &MortgageInput) -> CalcResult<MonthlyExpenses> {
    let months = Decimal::from(MONTHS_PER_YEAR);
    let property_tax = input.property_tax_annual / months;
    let home_insurance = input.home_insurance_annual / months;
    let total = [input.management_monthly, input.pmi_monthly]
        .into_iter()
        .try_fold(property_tax + home_insurance, |acc, x| acc.checked_add(x))
        .ok_or_else(|| out_of_range("management_monthly"))?;

    Ok(MonthlyExpenses {
        property_tax,
        home_insurance,
        management: input.management_monthly,
        pmi: input.pmi_monthly,
        total,
    })
}

fn out_of_range(field: &str) -> CalcError {
    CalcError::invalid(field, "Amount overflows the decimal range")
}

fn validate_input(input: &MortgageInput) -> CalcResult<()> {
    if input.home_price <= Decimal::ZERO {
        return Err(CalcError::invalid(
            "home_price",
            "Home price must be positive",
        ));
    }
    let expenses = [
        ("property_tax_annual", input.property_tax_annual),
        ("home_insurance_annual", input.home_insurance_annual),
        ("management_monthly", input.management_monthly),
        ("pmi_monthly", input.pmi_monthly),
    ];
    for (field, value) in expenses {
        if value < Decimal::ZERO {
            return Err(CalcError::invalid(field, "Expense cannot be negative"));
        }
    }
    Ok(())
}
