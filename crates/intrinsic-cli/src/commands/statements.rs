use clap::Args;
use serde_json::Value;

use intrinsic_core::statements::free_cash_flow::historical_free_cash_flows;
use intrinsic_core::statements::growth::{estimate_growth_rate, DEFAULT_GROWTH_WINDOW};
use intrinsic_core::statements::ratios::{build_ratio_profile, RatioSelection};

use super::HistoryDocument;
use crate::input;

/// Arguments for the ratio profile
#[derive(Args)]
pub struct RatiosArgs {
    /// Path to statement records (.json, .yaml, .yml)
    #[arg(long)]
    pub input: Option<String>,

    /// "all" for mean ratios across every year, or a fiscal year
    #[arg(long, default_value = "all")]
    pub ratio_year: RatioSelection,
}

/// Arguments for the growth estimate
#[derive(Args)]
pub struct GrowthArgs {
    /// Path to statement records (.json, .yaml, .yml)
    #[arg(long)]
    pub input: Option<String>,

    /// Number of most recent fiscal years averaged
    #[arg(long, default_value_t = DEFAULT_GROWTH_WINDOW)]
    pub window: usize,
}

/// Arguments for the historical FCF table
#[derive(Args)]
pub struct FcfArgs {
    /// Path to statement records (.json, .yaml, .yml)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_ratios(args: RatiosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc: HistoryDocument = input::require(args.input.as_deref(), "ratios")?;
    let result = build_ratio_profile(&doc.into_history(), args.ratio_year)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_growth(args: GrowthArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc: HistoryDocument = input::require(args.input.as_deref(), "growth")?;
    let result = estimate_growth_rate(&doc.into_history(), args.window)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_fcf(args: FcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let doc: HistoryDocument = input::require(args.input.as_deref(), "fcf")?;
    let result = historical_free_cash_flows(&doc.into_history())?;
    Ok(serde_json::to_value(result)?)
}
