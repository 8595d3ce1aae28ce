use coach_finance_core::investment::growth::{
    self, ContributionFrequency, InvestmentInput,
};
use coach_finance_core::preferences::{PreferenceHandle, ScheduleView};
use coach_finance_core::{CalcError, Currency};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn retirement_input() -> InvestmentInput {
    InvestmentInput {
        initial_principal: dec!(10000),
        contribution: dec!(500),
        frequency: ContributionFrequency::Monthly,
        annual_rate_pct: dec!(7),
        term_years: dec!(20),
        include_yearly: true,
    }
}

// ===========================================================================
// Compound growth
// ===========================================================================

#[test]
fn test_twenty_year_plan() {
    let output = growth::calculate_investment(&retirement_input()).unwrap();
    let result = output.result;
    assert!((result.future_value - dec!(300850.72)).abs() < dec!(0.01));
    assert_eq!(result.total_contributions, dec!(130000));
    assert_eq!(
        result.total_earnings,
        result.future_value - result.total_contributions
    );
    assert_eq!(result.periods, 240);
    assert!(output.warnings.is_empty());
}

#[test]
fn test_zero_rate_one_year_is_exact() {
    let mut input = retirement_input();
    input.annual_rate_pct = Decimal::ZERO;
    input.term_years = dec!(1);
    let output = growth::calculate_investment(&input).unwrap();
    assert_eq!(output.result.future_value, dec!(16000));
    assert_eq!(output.result.total_earnings, Decimal::ZERO);
    assert!(output.warnings.iter().any(|w| w.contains("Zero growth")));
}

#[test]
fn test_lump_sum_only() {
    let mut input = retirement_input();
    input.contribution = Decimal::ZERO;
    input.annual_rate_pct = dec!(12);
    input.term_years = dec!(1);
    let result = growth::calculate_investment(&input).unwrap().result;
    // 10000 * 1.01^12
    assert!((result.future_value - dec!(11268.25)).abs() < dec!(0.01));
    assert_eq!(result.total_contributions, dec!(10000));
}

#[test]
fn test_yearly_table_is_consistent() {
    let result = growth::calculate_investment(&retirement_input())
        .unwrap()
        .result;
    let table = result.yearly.unwrap();
    for (i, year) in table.iter().enumerate() {
        assert_eq!(year.year, i as u32 + 1);
        assert_eq!(
            year.earnings_to_date,
            year.balance - year.contributions_to_date
        );
    }
    assert_eq!(table.last().unwrap().balance, result.future_value);
}

#[test]
fn test_investment_is_idempotent() {
    let input = retirement_input();
    let a = growth::calculate_investment(&input).unwrap().result;
    let b = growth::calculate_investment(&input).unwrap().result;
    assert_eq!(a, b);
}

#[test]
fn test_yearly_contribution_mode_from_json() {
    let json = r#"{
        "initial_principal": "0",
        "contribution": "1200",
        "frequency": "yearly",
        "annual_rate_pct": "0",
        "term_years": "2"
    }"#;
    let input: InvestmentInput = serde_json::from_str(json).unwrap();
    let result = growth::calculate_investment(&input).unwrap().result;
    assert_eq!(result.monthly_contribution, dec!(100));
    assert_eq!(result.future_value, dec!(2400));
    assert!(result.yearly.is_none());
}

#[test]
fn test_out_of_range_growth_is_error() {
    let mut input = retirement_input();
    input.initial_principal = dec!(10000000000);
    input.annual_rate_pct = dec!(50);
    input.term_years = dec!(100);
    let err = growth::calculate_investment(&input).unwrap_err();
    assert!(matches!(err, CalcError::InvalidInput { ref field, .. } if field == "initial_principal"));
}

// ===========================================================================
// Display preferences across calculators
// ===========================================================================

#[test]
fn test_currency_switch_leaves_figures_untouched() {
    let handle = PreferenceHandle::default();
    let mut widget = handle.subscribe();

    let before = growth::calculate_investment(&retirement_input())
        .unwrap()
        .result;
    handle.set_currency(Currency::GBP);
    handle.set_schedule_view(ScheduleView::Monthly);
    let after = growth::calculate_investment(&retirement_input())
        .unwrap()
        .result;

    assert!(widget.has_changed());
    let prefs = widget.latest();
    assert_eq!(prefs.schedule_view, ScheduleView::Monthly);
    assert_eq!(before.future_value, after.future_value);
    assert!(prefs.format_amount(after.future_value).starts_with('£'));
}
