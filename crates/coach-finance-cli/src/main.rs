mod commands;
mod input;
mod output;
mod settings;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use coach_finance_core::preferences::PreferenceHandle;

use commands::investment::InvestmentArgs;
use commands::lending::{CommercialArgs, LoanArgs, MortgageArgs, ScheduleArgs};
use settings::Settings;

/// Mortgage, loan and investment calculators
#[derive(Parser)]
#[command(
    name = "cfc",
    version,
    about = "Mortgage, loan and investment calculators",
    long_about = "A CLI for the coaching site's financial calculators with decimal \
                  precision. Supports fixed-rate loans, residential and commercial \
                  mortgages, amortisation schedules and investment growth."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Settings file (YAML); falls back to $CFC_CONFIG
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed-rate loan payment and total interest
    Loan(LoanArgs),
    /// Residential mortgage with taxes, insurance and PMI
    Mortgage(MortgageArgs),
    /// Commercial mortgage with DSCR and LTV
    Commercial(CommercialArgs),
    /// Future value of savings with regular contributions
    Investment(InvestmentArgs),
    /// Print a monthly or yearly amortisation schedule
    Schedule(ScheduleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // stdout carries results; diagnostics go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    init_tracing(&settings.log_level);
    tracing::debug!(?settings, "settings loaded");

    let preferences = PreferenceHandle::new(settings.display_preferences());

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::lending::run_loan(args),
        Commands::Mortgage(args) => commands::lending::run_mortgage(args),
        Commands::Commercial(args) => commands::lending::run_commercial(args, &settings),
        Commands::Investment(args) => commands::investment::run_investment(args),
        Commands::Schedule(args) => {
            commands::lending::run_schedule(args, preferences.current().schedule_view)
        }
        Commands::Version => {
            println!("cfc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value, &preferences.current());
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
