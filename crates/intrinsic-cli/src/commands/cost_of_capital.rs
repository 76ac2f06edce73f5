use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use intrinsic_core::cost_of_capital::capm::{estimate_cost_of_equity, CapmInput, ReturnFrequency};
use intrinsic_core::cost_of_capital::returns::{align_returns, returns_at_frequency, PricePoint};
use intrinsic_core::cost_of_capital::synthetic_rating::{estimate_cost_of_debt, CostOfDebtInput};
use intrinsic_core::cost_of_capital::wacc::{calculate_wacc, WaccInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl From<FrequencyArg> for ReturnFrequency {
    fn from(f: FrequencyArg) -> Self {
        match f {
            FrequencyArg::Daily => ReturnFrequency::Daily,
            FrequencyArg::Weekly => ReturnFrequency::Weekly,
            FrequencyArg::Monthly => ReturnFrequency::Monthly,
            FrequencyArg::Quarterly => ReturnFrequency::Quarterly,
            FrequencyArg::Annual => ReturnFrequency::Annual,
        }
    }
}

/// Arguments for the CAPM cost of equity
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CapmArgs {
    /// Company periodic returns, comma separated
    #[arg(long, value_delimiter = ',')]
    pub company_returns: Vec<Decimal>,

    /// Market index periodic returns, comma separated
    #[arg(long, value_delimiter = ',')]
    pub index_returns: Vec<Decimal>,

    /// Annual risk-free rate (e.g. 0.04 for 4%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Observation frequency used to annualise the market return
    #[arg(long, value_enum, default_value = "daily")]
    pub frequency: FrequencyArg,

    /// Path to JSON/YAML input with returns or dated prices (overrides flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// CAPM input file: aligned returns, or dated closing prices that are
/// converted to returns and aligned on date first.
#[derive(Deserialize)]
#[serde(untagged)]
enum CapmDocument {
    Returns(CapmInput),
    Prices {
        company_prices: Vec<PricePoint>,
        index_prices: Vec<PricePoint>,
        risk_free_rate: Decimal,
        #[serde(default)]
        frequency: ReturnFrequency,
    },
}

/// Arguments for the synthetic-rating cost of debt
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CostOfDebtArgs {
    #[arg(long)]
    pub ebitda: Option<Decimal>,

    /// Depreciation and amortisation
    #[arg(long, alias = "da")]
    pub depreciation: Option<Decimal>,

    #[arg(long)]
    pub interest_expense: Option<Decimal>,

    /// Annual risk-free rate
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for WACC
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Pre-tax cost of debt
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    #[arg(long)]
    pub cost_of_equity: Option<Decimal>,

    /// Effective tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Total debt
    #[arg(long)]
    pub debt: Option<Decimal>,

    /// Market value of equity
    #[arg(long)]
    pub equity: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_capm(args: CapmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let capm_input = match input::load::<CapmDocument>(args.input.as_deref())? {
        Some(CapmDocument::Returns(input)) => input,
        Some(CapmDocument::Prices {
            company_prices,
            index_prices,
            risk_free_rate,
            frequency,
        }) => {
            let aligned = align_returns(
                &returns_at_frequency(&company_prices, frequency)?,
                &returns_at_frequency(&index_prices, frequency)?,
            );
            CapmInput {
                company_returns: aligned.company,
                index_returns: aligned.index,
                risk_free_rate,
                frequency,
            }
        }
        None => CapmInput {
            company_returns: args.company_returns,
            index_returns: args.index_returns,
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
            frequency: args.frequency.into(),
        },
    };

    let result = estimate_cost_of_equity(&capm_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cost_of_debt(args: CostOfDebtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let debt_input: CostOfDebtInput = match input::load(args.input.as_deref())? {
        Some(input) => input,
        None => CostOfDebtInput {
            ebitda: args.ebitda.ok_or("--ebitda is required (or provide --input)")?,
            depreciation_and_amortization: args
                .depreciation
                .ok_or("--depreciation is required (or provide --input)")?,
            interest_expense: args
                .interest_expense
                .ok_or("--interest-expense is required (or provide --input)")?,
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
        },
    };

    let result = estimate_cost_of_debt(&debt_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wacc_input: WaccInput = match input::load(args.input.as_deref())? {
        Some(input) => input,
        None => WaccInput {
            cost_of_debt: args
                .cost_of_debt
                .ok_or("--cost-of-debt is required (or provide --input)")?,
            cost_of_equity: args
                .cost_of_equity
                .ok_or("--cost-of-equity is required (or provide --input)")?,
            tax_rate: args.tax_rate.ok_or("--tax-rate is required (or provide --input)")?,
            total_debt: args.debt.ok_or("--debt is required (or provide --input)")?,
            total_equity: args.equity.ok_or("--equity is required (or provide --input)")?,
        },
    };

    let result = calculate_wacc(&wacc_input)?;
    Ok(serde_json::to_value(result)?)
}
