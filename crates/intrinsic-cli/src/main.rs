mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::cost_of_capital::{CapmArgs, CostOfDebtArgs, WaccArgs};
use commands::statements::{FcfArgs, GrowthArgs, RatiosArgs};
use commands::valuation::{ForecastArgs, ValueArgs};

/// Multi-scenario discounted cash flow valuation
#[derive(Parser)]
#[command(
    name = "intrinsic",
    version,
    about = "Multi-scenario DCF valuation from financial statements",
    long_about = "Estimates intrinsic value per share from historical statements: \
                  ratio-driven FCF forecasts under neutral, positive and negative \
                  outlooks, a synthetic-rating cost of debt, a CAPM cost of equity \
                  and WACC discounting. All arithmetic is decimal."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log pipeline stages to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full valuation model
    Value(ValueArgs),
    /// Statement-line ratios to revenue
    Ratios(RatiosArgs),
    /// Sustainable growth rate (retention × ROE)
    Growth(GrowthArgs),
    /// Historical free cash flow per fiscal year
    Fcf(FcfArgs),
    /// Three-outlook FCF forecast
    Forecast(ForecastArgs),
    /// CAPM cost of equity from return series
    Capm(CapmArgs),
    /// Synthetic-rating cost of debt
    CostOfDebt(CostOfDebtArgs),
    /// Weighted average cost of capital
    Wacc(WaccArgs),
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

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Value(args) => commands::valuation::run_value(args),
        Commands::Ratios(args) => commands::statements::run_ratios(args),
        Commands::Growth(args) => commands::statements::run_growth(args),
        Commands::Fcf(args) => commands::statements::run_fcf(args),
        Commands::Forecast(args) => commands::valuation::run_forecast(args),
        Commands::Capm(args) => commands::cost_of_capital::run_capm(args),
        Commands::CostOfDebt(args) => commands::cost_of_capital::run_cost_of_debt(args),
        Commands::Wacc(args) => commands::cost_of_capital::run_wacc(args),
        Commands::Version => {
            println!("intrinsic {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
