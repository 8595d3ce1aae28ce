use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::CalcError;
use crate::types::{Money, Percent, Rate, Years};
use crate::CalcResult;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Longest supported horizon: 100 years of monthly periods.
pub const MAX_PERIODS: u32 = 1200;

/// Convert an annual percentage (6.5) into a monthly decimal rate (0.065 / 12).
pub fn monthly_rate(annual_rate_pct: Percent) -> CalcResult<Rate> {
    if annual_rate_pct < Decimal::ZERO {
        return Err(CalcError::invalid(
            "annual_rate_pct",
            "Interest rate cannot be negative",
        ));
    }
    Ok(annual_rate_pct / dec!(100) / Decimal::from(MONTHS_PER_YEAR))
}

/// Number of monthly periods in a term, `round(term_years * 12)`.
///
/// Fractional terms are rounded half away from zero, so 2.5 years is 30
/// periods and 1/12 of a year is a single period.
pub fn month_count(term_years: Years) -> CalcResult<u32> {
    if term_years <= Decimal::ZERO {
        return Err(CalcError::invalid(
            "term_years",
            "Term must be greater than zero",
        ));
    }

    let too_long = || {
        CalcError::invalid(
            "term_years",
            format!("Term exceeds {} months", MAX_PERIODS),
        )
    };

    let months = term_years
        .checked_mul(Decimal::from(MONTHS_PER_YEAR))
        .ok_or_else(too_long)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    match months.to_u32() {
        Some(0) => Err(CalcError::invalid(
            "term_years",
            "Term is shorter than one monthly period",
        )),
        Some(n) if n <= MAX_PERIODS => Ok(n),
        _ => Err(too_long()),
    }
}

fn out_of_range(field: &str, what: &str) -> CalcError {
    CalcError::invalid(field, format!("{what} overflows the decimal range"))
}

/// (1 + r)^n
pub fn compound_factor(rate: Rate, nper: u32) -> CalcResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(nper))
        .ok_or_else(|| {
            CalcError::invalid(
                "annual_rate_pct",
                format!("Compounding {nper} periods overflows the decimal range"),
            )
        })
}

/// Level payment that fully amortises `principal` over `nper` periods.
///
/// Returned as a positive amount. Zero rate falls back to straight-line
/// repayment `principal / nper`.
pub fn level_payment(rate: Rate, nper: u32, principal: Money) -> CalcResult<Money> {
    if nper == 0 {
        return Err(CalcError::invalid(
            "nper",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(CalcError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|interest| interest.checked_mul(factor))
        .and_then(|scaled| scaled.checked_div(denominator))
        .ok_or_else(|| out_of_range("principal", "Level payment"))
}

/// Future value of a lump sum plus a level end-of-period contribution.
///
/// Zero rate is the plain sum `present_value + contribution * nper`.
pub fn future_value(
    rate: Rate,
    nper: u32,
    present_value: Money,
    contribution: Money,
) -> CalcResult<Money> {
    let (growth, annuity_factor) = if rate.is_zero() {
        (Decimal::ONE, Decimal::from(nper))
    } else {
        let factor = compound_factor(rate, nper)?;
        let annuity_factor = (factor - Decimal::ONE)
            .checked_div(rate)
            .ok_or_else(|| out_of_range("annual_rate_pct", "Annuity factor"))?;
        (factor, annuity_factor)
    };

    let lump_sum = present_value
        .checked_mul(growth)
        .ok_or_else(|| out_of_range("initial_principal", "Future value"))?;
    contribution
        .checked_mul(annuity_factor)
        .and_then(|stream| stream.checked_add(lump_sum))
        .ok_or_else(|| out_of_range("contribution", "Future value"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate() {
        assert_eq!(monthly_rate(dec!(12)).unwrap(), dec!(0.01));
        assert_eq!(monthly_rate(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(monthly_rate(dec!(-1)).is_err());
    }

    #[test]
    fn test_month_count_rounds_fractional_terms() {
        assert_eq!(month_count(dec!(30)).unwrap(), 360);
        assert_eq!(month_count(dec!(2.5)).unwrap(), 30);
        assert_eq!(month_count(Decimal::ONE / dec!(12)).unwrap(), 1);
        // 0.04 years = 0.48 months rounds to zero periods
        assert!(month_count(dec!(0.04)).is_err());
    }

    #[test]
    fn test_month_count_bounds() {
        assert!(month_count(Decimal::ZERO).is_err());
        assert!(month_count(dec!(-5)).is_err());
        assert_eq!(month_count(dec!(100)).unwrap(), MAX_PERIODS);
        assert!(month_count(dec!(100.1)).is_err());
    }

    #[test]
    fn test_month_count_huge_term_is_error() {
        let err = month_count(dec!(7000000000000000000000000000)).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "term_years"));
    }

    #[test]
    fn test_level_payment_zero_rate() {
        let payment = level_payment(Decimal::ZERO, 360, dec!(360000)).unwrap();
        assert_eq!(payment, dec!(1000));
    }

    #[test]
    fn test_level_payment_single_period() {
        // One period at 1%: repay principal plus one period of interest
        let payment = level_payment(dec!(0.01), 1, dec!(100000)).unwrap();
        assert_eq!(payment, dec!(101000));
    }

    #[test]
    fn test_future_value_zero_rate() {
        let fv = future_value(Decimal::ZERO, 12, dec!(10000), dec!(500)).unwrap();
        assert_eq!(fv, dec!(16000));
    }

    #[test]
    fn test_future_value_lump_sum() {
        // 1000 at 1% for 2 periods = 1020.1
        let fv = future_value(dec!(0.01), 2, dec!(1000), Decimal::ZERO).unwrap();
        assert_eq!(fv, dec!(1020.1));
    }

    #[test]
    fn test_level_payment_overflow_is_error() {
        // (1 + 0.5/12)^1200 fits, the product with a 1e10 principal does not
        let rate = monthly_rate(dec!(50)).unwrap();
        let err = level_payment(rate, MAX_PERIODS, dec!(10000000000)).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "principal"));
    }

    #[test]
    fn test_future_value_overflow_is_error() {
        let rate = monthly_rate(dec!(50)).unwrap();
        let err = future_value(rate, MAX_PERIODS, dec!(10000000000), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "initial_principal"));

        let err = future_value(rate, MAX_PERIODS, Decimal::ZERO, dec!(10000000000)).unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "contribution"));
    }

    #[test]
    fn test_compound_factor_overflow_is_error() {
        assert!(compound_factor(dec!(1), MAX_PERIODS).is_err());
    }
}
