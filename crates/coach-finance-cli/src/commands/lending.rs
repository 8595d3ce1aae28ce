use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use coach_finance_core::amortization::{self, LoanParameters};
use coach_finance_core::lending::commercial::{self, CommercialMortgageInput};
use coach_finance_core::lending::loan::{self, LoanInput};
use coach_finance_core::lending::mortgage::{self, DownPayment, MortgageInput};
use coach_finance_core::preferences::ScheduleView;

use crate::input;
use crate::settings::Settings;

/// Read a typed input from `--input`, then stdin, else build it from flags.
fn load_or<T: serde::de::DeserializeOwned>(
    path: &Option<String>,
    from_flags: impl FnOnce() -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(ref path) = path {
        input::file::read_input(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(data)
    } else {
        from_flags()
    }
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

/// Loan terms shared by `loan` and `schedule`
#[derive(Args)]
pub struct LoanTermsArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 8 for 8%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years (fractions allowed, rounded to whole months)
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Date of the first payment (YYYY-MM-DD) to date each schedule row
    #[arg(long)]
    pub first_payment: Option<NaiveDate>,
}

impl LoanTermsArgs {
    fn parameters(&self) -> Result<LoanParameters, Box<dyn std::error::Error>> {
        let amount = self
            .amount
            .ok_or("--amount is required (or provide --input)")?;
        let rate = self.rate.ok_or("--rate is required (or provide --input)")?;
        let years = self.years.ok_or("--years is required (or provide --input)")?;

        let mut params = LoanParameters::new(amount, rate, years);
        params.first_payment_date = self.first_payment;
        Ok(params)
    }
}

/// Arguments for a fixed-rate loan
#[derive(Args)]
pub struct LoanArgs {
    #[command(flatten)]
    pub terms: LoanTermsArgs,

    /// Include the month-by-month schedule
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = load_or(&args.terms.input, || {
        Ok(LoanInput {
            parameters: args.terms.parameters()?,
            include_schedule: args.schedule,
        })
    })?;

    let result = loan::calculate_loan(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// Mortgage
// ---------------------------------------------------------------------------

/// Arguments for a residential mortgage
#[derive(Args)]
pub struct MortgageArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price of the home
    #[arg(long)]
    pub home_price: Option<Decimal>,

    /// Down payment as a percent of the price
    #[arg(long, conflicts_with = "down_amount")]
    pub down_pct: Option<Decimal>,

    /// Down payment as an absolute amount
    #[arg(long)]
    pub down_amount: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long, default_value = "30")]
    pub years: Decimal,

    /// Annual property tax
    #[arg(long, default_value = "0")]
    pub property_tax: Decimal,

    /// Annual home insurance premium
    #[arg(long, default_value = "0")]
    pub insurance: Decimal,

    /// Monthly HOA / management fee
    #[arg(long, default_value = "0")]
    pub management: Decimal,

    /// Monthly private mortgage insurance
    #[arg(long, default_value = "0")]
    pub pmi: Decimal,

    /// Include the month-by-month schedule
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_mortgage(args: MortgageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage_input: MortgageInput = load_or(&args.input, || {
        let home_price = args
            .home_price
            .ok_or("--home-price is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        let down_payment = match (args.down_pct, args.down_amount) {
            (Some(pct), None) => DownPayment::Percent(pct),
            (None, Some(amount)) => DownPayment::Amount(amount),
            _ => return Err("one of --down-pct or --down-amount is required".into()),
        };

        Ok(MortgageInput {
            home_price,
            down_payment,
            annual_rate_pct: rate,
            term_years: args.years,
            property_tax_annual: args.property_tax,
            home_insurance_annual: args.insurance,
            management_monthly: args.management,
            pmi_monthly: args.pmi,
            include_schedule: args.schedule,
        })
    })?;

    let result = mortgage::calculate_mortgage(&mortgage_input)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// Commercial mortgage
// ---------------------------------------------------------------------------

/// Arguments for a commercial property loan
#[derive(Args)]
pub struct CommercialArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Appraised property value
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Down payment (absolute amount)
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long, default_value = "20")]
    pub years: Decimal,

    /// Annual net operating income
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Healthy DSCR threshold (defaults to the settings file, then 1.25)
    #[arg(long)]
    pub dscr_threshold: Option<Decimal>,

    /// Include the month-by-month schedule
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_commercial(
    args: CommercialArgs,
    settings: &Settings,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut commercial_input: CommercialMortgageInput = load_or(&args.input, || {
        let property_value = args
            .property_value
            .ok_or("--property-value is required (or provide --input)")?;
        let down_payment = args
            .down_payment
            .ok_or("--down-payment is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        let noi = args.noi.ok_or("--noi is required (or provide --input)")?;

        Ok(CommercialMortgageInput {
            property_value,
            down_payment,
            annual_rate_pct: rate,
            term_years: args.years,
            net_operating_income_annual: noi,
            dscr_threshold: args.dscr_threshold,
            include_schedule: args.schedule,
        })
    })?;

    if commercial_input.dscr_threshold.is_none() {
        commercial_input.dscr_threshold = Some(settings.dscr_threshold);
    }

    let result = commercial::calculate_commercial_mortgage(&commercial_input)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// Amortisation schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ViewArg {
    Monthly,
    Yearly,
}

impl From<ViewArg> for ScheduleView {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Monthly => ScheduleView::Monthly,
            ViewArg::Yearly => ScheduleView::Yearly,
        }
    }
}

/// Arguments for printing an amortisation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub terms: LoanTermsArgs,

    /// Row granularity (defaults to the settings file, then yearly)
    #[arg(long)]
    pub view: Option<ViewArg>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    default_view: ScheduleView,
) -> Result<Value, Box<dyn std::error::Error>> {
    let params: LoanParameters = load_or(&args.terms.input, || args.terms.parameters())?;
    let view = args.view.map(ScheduleView::from).unwrap_or(default_view);

    let output = amortization::build_amortization(&params)?;
    let schedule = output.result;
    let rows = match view {
        ScheduleView::Monthly => serde_json::to_value(&schedule.rows)?,
        ScheduleView::Yearly => serde_json::to_value(&schedule.yearly)?,
    };

    Ok(json!({
        "monthly_payment": schedule.monthly_payment,
        "periods": schedule.periods,
        "total_interest": schedule.total_interest,
        "total_principal": schedule.total_principal,
        "view": view,
        "results": rows,
        "methodology": output.methodology,
    }))
}
