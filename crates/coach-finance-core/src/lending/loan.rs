use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{self, AmortizationSchedule, LoanParameters, LoanResult};
use crate::types::{with_metadata, ComputationOutput};
use crate::CalcResult;

/// Input for a plain personal or auto loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    #[serde(flatten)]
    pub parameters: LoanParameters,
    /// Attach the month-by-month schedule to the output
    #[serde(default)]
    pub include_schedule: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOutput {
    #[serde(flatten)]
    pub summary: LoanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<AmortizationSchedule>,
}

/// Loan payment, total cost and interest straight from the amortisation engine.
pub fn calculate_loan(input: &LoanInput) -> CalcResult<ComputationOutput<LoanOutput>> {
    let start = Instant::now();

    let summary = amortization::summarize(&input.parameters)?;
    let schedule = if input.include_schedule {
        Some(amortization::amortize(&input.parameters)?)
    } else {
        None
    };

    let output = LoanOutput { summary, schedule };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate loan (level monthly payment)",
        &input.parameters,
        Vec::new(),
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn car_loan() -> LoanInput {
        LoanInput {
            parameters: LoanParameters::new(dec!(25000), dec!(8), dec!(5)),
            include_schedule: false,
        }
    }

    #[test]
    fn test_loan_known_answer() {
        let result = calculate_loan(&car_loan()).unwrap().result;
        assert!((result.summary.monthly_payment - dec!(506.91)).abs() < dec!(0.01));
        assert!((result.summary.total_interest - dec!(5414.59)).abs() < dec!(0.01));
        assert_eq!(
            result.summary.total_payment,
            result.summary.total_interest + dec!(25000)
        );
        assert!(result.schedule.is_none());
    }

    #[test]
    fn test_loan_with_schedule() {
        let mut input = car_loan();
        input.include_schedule = true;
        let result = calculate_loan(&input).unwrap().result;
        let schedule = result.schedule.unwrap();
        assert_eq!(schedule.rows.len(), 60);
        assert_eq!(schedule.yearly.len(), 5);
        assert_eq!(schedule.rows[59].balance, Decimal::ZERO);
    }

    #[test]
    fn test_loan_zero_amount_error() {
        let mut input = car_loan();
        input.parameters.principal = Decimal::ZERO;
        assert!(calculate_loan(&input).is_err());
    }

    #[test]
    fn test_loan_input_from_flat_json() {
        let json = r#"{"principal": "25000", "annual_rate_pct": "8", "term_years": "5"}"#;
        let input: LoanInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.parameters.principal, dec!(25000));
        assert!(!input.include_schedule);
    }
}
