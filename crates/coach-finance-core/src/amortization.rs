use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CalcError;
use crate::time_value::{self, MONTHS_PER_YEAR};
use crate::types::*;
use crate::CalcResult;

/// Terms of a fixed-rate, fully amortising loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Money,
    /// Nominal annual rate as a percentage (6.5 = 6.5%)
    pub annual_rate_pct: Percent,
    pub term_years: Years,
    /// Date of the first monthly payment; rows are undated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanParameters {
    pub fn new(principal: Money, annual_rate_pct: Percent, term_years: Years) -> Self {
        Self {
            principal,
            annual_rate_pct,
            term_years,
            first_payment_date: None,
        }
    }

    pub fn with_first_payment_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_date = Some(date);
        self
    }
}

/// One month of the amortisation schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    pub year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

/// Interest and principal rolled up over one loan year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyAggregate {
    pub year: u32,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

/// Headline figures for a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub principal: Money,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub periods: u32,
}

/// Full month-by-month trajectory plus yearly rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub periods: u32,
    pub total_interest: Money,
    pub total_principal: Money,
    pub rows: Vec<AmortizationRow>,
    pub yearly: Vec<YearlyAggregate>,
}

/// Validated loan terms in periodic form.
struct Terms {
    principal: Money,
    rate: Rate,
    periods: u32,
}

fn resolve_terms(params: &LoanParameters) -> CalcResult<Terms> {
    if params.principal <= Decimal::ZERO {
        return Err(CalcError::invalid(
            "principal",
            "Loan principal must be positive",
        ));
    }
    let rate = time_value::monthly_rate(params.annual_rate_pct)?;
    let periods = time_value::month_count(params.term_years)?;

    Ok(Terms {
        principal: params.principal,
        rate,
        periods,
    })
}

/// Fixed monthly principal-and-interest payment:
/// P * r(1+r)^n / ((1+r)^n - 1), or P / n when the rate is zero.
pub fn monthly_payment(params: &LoanParameters) -> CalcResult<Money> {
    let terms = resolve_terms(params)?;
    time_value::level_payment(terms.rate, terms.periods, terms.principal)
}

/// Convenience form of [`monthly_payment`] taking the three raw terms.
pub fn compute_monthly_payment(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: Years,
) -> CalcResult<Money> {
    monthly_payment(&LoanParameters::new(principal, annual_rate_pct, term_years))
}

/// Month-by-month amortisation schedule, one row per period.
///
/// The final row repays whatever balance remains, so rounding residue never
/// leaves a non-zero balance and principal repaid sums to the loan amount.
pub fn generate_schedule(params: &LoanParameters) -> CalcResult<Vec<AmortizationRow>> {
    let terms = resolve_terms(params)?;
    let payment = time_value::level_payment(terms.rate, terms.periods, terms.principal)?;
    build_rows(&terms, payment, params.first_payment_date)
}

fn build_rows(
    terms: &Terms,
    payment: Money,
    first_payment_date: Option<NaiveDate>,
) -> CalcResult<Vec<AmortizationRow>> {
    let mut rows = Vec::with_capacity(terms.periods as usize);
    let mut balance = terms.principal;

    for period in 1..=terms.periods {
        let interest = balance * terms.rate;
        let scheduled = payment - interest;
        let principal = if period == terms.periods {
            balance
        } else {
            scheduled.min(balance)
        };
        balance = (balance - principal).max(Decimal::ZERO);

        // Only the clamped final payment deviates from the level amount
        let row_payment = if principal == scheduled {
            payment
        } else {
            interest + principal
        };

        let payment_date = match first_payment_date {
            Some(first) => Some(payment_date_for(first, period)?),
            None => None,
        };

        rows.push(AmortizationRow {
            period,
            year: year_of_period(period),
            payment_date,
            payment: row_payment,
            interest,
            principal,
            balance,
        });
    }

    Ok(rows)
}

/// Loan year a 1-based period falls in: ceil(period / 12).
pub fn year_of_period(period: u32) -> u32 {
    period.div_ceil(MONTHS_PER_YEAR)
}

fn payment_date_for(first: NaiveDate, period: u32) -> CalcResult<NaiveDate> {
    first
        .checked_add_months(Months::new(period - 1))
        .ok_or_else(|| {
            CalcError::invalid(
                "first_payment_date",
                format!("Payment date for period {period} is out of range"),
            )
        })
}

/// Group rows by loan year in ascending order.
pub fn aggregate_yearly(rows: &[AmortizationRow]) -> Vec<YearlyAggregate> {
    let mut years: Vec<YearlyAggregate> = Vec::new();
    let mut last_period_in_year: Vec<u32> = Vec::new();

    for row in rows {
        let idx = match years.binary_search_by_key(&row.year, |y| y.year) {
            Ok(idx) => idx,
            Err(idx) => {
                years.insert(
                    idx,
                    YearlyAggregate {
                        year: row.year,
                        interest: Decimal::ZERO,
                        principal: Decimal::ZERO,
                        ending_balance: row.balance,
                    },
                );
                last_period_in_year.insert(idx, row.period);
                idx
            }
        };

        let agg = &mut years[idx];
        agg.interest += row.interest;
        agg.principal += row.principal;
        if row.period >= last_period_in_year[idx] {
            last_period_in_year[idx] = row.period;
            agg.ending_balance = row.balance;
        }
    }

    years
}

/// payment * periods. Interest and principal columns never sum past this.
fn total_paid(payment: Money, periods: u32) -> CalcResult<Money> {
    payment
        .checked_mul(Decimal::from(periods))
        .ok_or_else(|| {
            CalcError::invalid(
                "principal",
                "Total of payments overflows the decimal range",
            )
        })
}

/// Headline payment, total paid and total interest for a loan.
pub fn summarize(params: &LoanParameters) -> CalcResult<LoanResult> {
    let terms = resolve_terms(params)?;
    let payment = time_value::level_payment(terms.rate, terms.periods, terms.principal)?;
    let total_payment = total_paid(payment, terms.periods)?;

    tracing::debug!(
        principal = %terms.principal,
        periods = terms.periods,
        payment = %payment,
        "loan summarised"
    );

    Ok(LoanResult {
        principal: terms.principal,
        monthly_payment: payment,
        total_payment,
        total_interest: total_payment - terms.principal,
        periods: terms.periods,
    })
}

/// Schedule, yearly rollup and totals for a loan.
pub fn amortize(params: &LoanParameters) -> CalcResult<AmortizationSchedule> {
    let terms = resolve_terms(params)?;
    let payment = time_value::level_payment(terms.rate, terms.periods, terms.principal)?;
    total_paid(payment, terms.periods)?;
    let rows = build_rows(&terms, payment, params.first_payment_date)?;
    let yearly = aggregate_yearly(&rows);

    let total_interest: Money = rows.iter().map(|r| r.interest).sum();
    let total_principal: Money = rows.iter().map(|r| r.principal).sum();

    tracing::debug!(
        principal = %terms.principal,
        periods = terms.periods,
        payment = %payment,
        total_interest = %total_interest,
        "amortisation schedule built"
    );

    Ok(AmortizationSchedule {
        monthly_payment: payment,
        periods: terms.periods,
        total_interest,
        total_principal,
        rows,
        yearly,
    })
}

/// Build the amortisation schedule wrapped in the standard output envelope.
pub fn build_amortization(
    params: &LoanParameters,
) -> CalcResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let schedule = amortize(params)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortisation (monthly compounding)",
        &serde_json::json!({
            "principal": params.principal.to_string(),
            "annual_rate_pct": params.annual_rate_pct.to_string(),
            "term_years": params.term_years.to_string(),
            "periods": schedule.periods,
        }),
        Vec::new(),
        elapsed,
        schedule,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn mortgage_params() -> LoanParameters {
        LoanParameters::new(dec!(320000), dec!(6.5), dec!(30))
    }

    #[test]
    fn test_standard_mortgage_payment() {
        let payment = monthly_payment(&mortgage_params()).unwrap();
        assert!(
            (payment - dec!(2022.62)).abs() < dec!(0.01),
            "Expected ~2022.62, got {payment}"
        );
    }

    #[test]
    fn test_zero_rate_payment_exact() {
        let params = LoanParameters::new(dec!(360000), Decimal::ZERO, dec!(30));
        assert_eq!(monthly_payment(&params).unwrap(), dec!(1000));
    }

    #[test]
    fn test_single_period_loan() {
        let params = LoanParameters::new(dec!(100000), dec!(12), Decimal::ONE / dec!(12));
        assert_eq!(monthly_payment(&params).unwrap(), dec!(101000));

        let zero = LoanParameters::new(dec!(100000), Decimal::ZERO, Decimal::ONE / dec!(12));
        assert_eq!(monthly_payment(&zero).unwrap(), dec!(100000));
    }

    #[test]
    fn test_invalid_principal() {
        let params = LoanParameters::new(Decimal::ZERO, dec!(5), dec!(10));
        assert!(monthly_payment(&params).is_err());
        let params = LoanParameters::new(dec!(-100), dec!(5), dec!(10));
        assert!(generate_schedule(&params).is_err());
    }

    #[test]
    fn test_invalid_rate_and_term() {
        assert!(compute_monthly_payment(dec!(1000), dec!(-0.5), dec!(10)).is_err());
        assert!(compute_monthly_payment(dec!(1000), dec!(5), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_schedule_length_and_year_index() {
        let rows = generate_schedule(&mortgage_params()).unwrap();
        assert_eq!(rows.len(), 360);
        assert_eq!(rows[0].period, 1);
        assert_eq!(rows[0].year, 1);
        assert_eq!(rows[11].year, 1);
        assert_eq!(rows[12].year, 2);
        assert_eq!(rows[359].year, 30);
    }

    #[test]
    fn test_first_row_split() {
        let rows = generate_schedule(&LoanParameters::new(dec!(1200), dec!(12), Decimal::ONE))
            .unwrap();
        // First month interest = 1200 * 1% = 12
        assert_eq!(rows[0].interest, dec!(12));
        assert_eq!(rows[0].interest + rows[0].principal, rows[0].payment);
    }

    #[test]
    fn test_schedule_clears_balance() {
        let rows = generate_schedule(&mortgage_params()).unwrap();
        let last = rows.last().unwrap();
        assert_eq!(last.balance, Decimal::ZERO);
        assert!(rows.iter().all(|r| r.balance >= Decimal::ZERO));
    }

    #[test]
    fn test_payment_dates_advance_monthly() {
        let params = LoanParameters::new(dec!(5000), dec!(5), Decimal::ONE)
            .with_first_payment_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let rows = generate_schedule(&params).unwrap();
        assert_eq!(rows[0].payment_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        // End-of-month clamps into the shorter month
        assert_eq!(rows[1].payment_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(rows[11].payment_date, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn test_undated_rows_by_default() {
        let rows = generate_schedule(&mortgage_params()).unwrap();
        assert!(rows.iter().all(|r| r.payment_date.is_none()));
    }

    #[test]
    fn test_yearly_partial_final_year() {
        // 2.5 years = 30 periods: years 1, 2 full, year 3 has six months
        let rows = generate_schedule(&LoanParameters::new(dec!(10000), dec!(6), dec!(2.5)))
            .unwrap();
        let yearly = aggregate_yearly(&rows);
        assert_eq!(yearly.len(), 3);
        assert_eq!(yearly.iter().map(|y| y.year).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(yearly[1].ending_balance, rows[23].balance);
        assert_eq!(yearly[2].ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_handles_unordered_rows() {
        let rows = generate_schedule(&LoanParameters::new(dec!(2400), dec!(6), dec!(2))).unwrap();
        let mut shuffled = rows.clone();
        shuffled.reverse();
        let forward = aggregate_yearly(&rows);
        let backward = aggregate_yearly(&shuffled);
        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(backward.iter()) {
            assert_eq!(f.year, b.year);
            assert_eq!(f.ending_balance, b.ending_balance);
        }
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_yearly(&[]).is_empty());
    }

    #[test]
    fn test_total_of_payments_overflow_is_error() {
        // The level payment fits; 1200 of them do not
        let params = LoanParameters::new(dec!(79000000000000000000000000000), dec!(0.12), dec!(100));
        assert!(monthly_payment(&params).is_ok());
        assert!(matches!(
            summarize(&params),
            Err(CalcError::InvalidInput { ref field, .. }) if field == "principal"
        ));
        assert!(amortize(&params).is_err());
    }

    #[test]
    fn test_summary_matches_schedule() {
        let params = LoanParameters::new(dec!(25000), dec!(8), dec!(5));
        let summary = summarize(&params).unwrap();
        let schedule = amortize(&params).unwrap();
        assert_eq!(summary.monthly_payment, schedule.monthly_payment);
        assert_eq!(summary.periods, 60);
        assert!((summary.total_interest - schedule.total_interest).abs() < dec!(0.000001));
    }

    #[test]
    fn test_build_amortization_envelope() {
        let output = build_amortization(&mortgage_params()).unwrap();
        assert_eq!(output.result.rows.len(), 360);
        assert_eq!(output.result.yearly.len(), 30);
        assert!(output.warnings.is_empty());
        assert_eq!(output.metadata.precision, "rust_decimal_128bit");
    }
}
