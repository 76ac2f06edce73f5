use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use intrinsic_core::forecast::engine::{forecast_free_cash_flows, ForecastInput};
use intrinsic_core::forecast::scenario::DEFAULT_SCENARIO_SPREAD;
use intrinsic_core::statements::growth::{estimate_growth_rate, DEFAULT_GROWTH_WINDOW};
use intrinsic_core::statements::ratios::{build_ratio_profile, RatioSelection};
use intrinsic_core::valuation::model::{run_dcf_model, DcfModelInput};

use super::HistoryDocument;
use crate::input;

/// Arguments for the end-to-end valuation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ValueArgs {
    /// Path to the model input (.json, .yaml, .yml): history, market data,
    /// risk-free rate, tax rate and optional assumptions
    #[arg(long)]
    pub input: Option<String>,

    /// Explicit forecast horizon in years
    #[arg(long)]
    pub forecast_years: Option<u32>,

    /// Perpetuity growth rate for the terminal value
    #[arg(long)]
    pub perpetuity_growth: Option<Decimal>,

    /// "all" or a fiscal year to source the ratio profile from
    #[arg(long)]
    pub ratio_year: Option<RatioSelection>,

    /// Neutral growth rate, replacing the retention × ROE estimate
    #[arg(long)]
    pub growth_rate: Option<Decimal>,

    /// Growth added to / removed from the positive / negative outlook
    #[arg(long)]
    pub scenario_spread: Option<Decimal>,

    /// Cost of equity, replacing the CAPM regression
    #[arg(long)]
    pub cost_of_equity: Option<Decimal>,
}

/// Arguments for the FCF forecast
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ForecastArgs {
    /// Path to statement records (.json, .yaml, .yml)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, default_value_t = 5)]
    pub forecast_years: u32,

    /// Neutral growth rate; estimated from the statements when omitted
    #[arg(long)]
    pub growth_rate: Option<Decimal>,

    #[arg(long, default_value_t = DEFAULT_SCENARIO_SPREAD)]
    pub scenario_spread: Decimal,

    #[arg(long, default_value = "all")]
    pub ratio_year: RatioSelection,

    /// Years averaged by the growth estimate
    #[arg(long, default_value_t = DEFAULT_GROWTH_WINDOW)]
    pub window: usize,
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut model_input: DcfModelInput = input::require(args.input.as_deref(), "value")?;

    let assumptions = &mut model_input.assumptions;
    if let Some(years) = args.forecast_years {
        assumptions.forecast_years = years;
    }
    if let Some(g) = args.perpetuity_growth {
        assumptions.perpetuity_growth_rate = g;
    }
    if let Some(selection) = args.ratio_year {
        assumptions.ratio_selection = selection;
    }
    if let Some(spread) = args.scenario_spread {
        assumptions.scenario_spread = spread;
    }
    if args.growth_rate.is_some() {
        assumptions.growth_rate_override = args.growth_rate;
    }
    if args.cost_of_equity.is_some() {
        assumptions.cost_of_equity_override = args.cost_of_equity;
    }

    let result = run_dcf_model(&model_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc: HistoryDocument = input::require(args.input.as_deref(), "forecast")?;
    let history = doc.into_history();

    let profile = build_ratio_profile(&history, args.ratio_year)?;
    let mut warnings = profile.warnings;

    let growth_rate = match args.growth_rate {
        Some(g) => g,
        None => {
            let growth = estimate_growth_rate(&history, args.window)?;
            warnings.extend(growth.warnings);
            growth.result.growth_rate
        }
    };

    let forecast_input = ForecastInput::seeded_from(
        history.latest(),
        profile.result,
        growth_rate,
        args.forecast_years,
        args.scenario_spread,
    )?;
    let mut result = forecast_free_cash_flows(&forecast_input)?;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;

    Ok(serde_json::to_value(result)?)
}
