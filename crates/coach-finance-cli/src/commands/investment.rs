use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use coach_finance_core::investment::growth::{self, ContributionFrequency, InvestmentInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Monthly,
    Yearly,
}

impl From<FrequencyArg> for ContributionFrequency {
    fn from(f: FrequencyArg) -> Self {
        match f {
            FrequencyArg::Monthly => ContributionFrequency::Monthly,
            FrequencyArg::Yearly => ContributionFrequency::Yearly,
        }
    }
}

/// Arguments for investment growth projection
#[derive(Args)]
pub struct InvestmentArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Starting balance
    #[arg(long, default_value = "0")]
    pub principal: Decimal,

    /// Regular contribution amount
    #[arg(long, default_value = "0")]
    pub contribution: Decimal,

    /// How often the contribution is made
    #[arg(long, value_enum, default_value = "monthly")]
    pub frequency: FrequencyArg,

    /// Expected annual return in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Investment horizon in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Include a year-by-year growth table
    #[arg(long)]
    pub yearly: bool,
}

pub fn run_investment(args: InvestmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let investment_input: InvestmentInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        let years = args.years.ok_or("--years is required (or provide --input)")?;

        InvestmentInput {
            initial_principal: args.principal,
            contribution: args.contribution,
            frequency: args.frequency.into(),
            annual_rate_pct: rate,
            term_years: years,
            include_yearly: args.yearly,
        }
    };

    let result = growth::calculate_investment(&investment_input)?;
    Ok(serde_json::to_value(result)?)
}
