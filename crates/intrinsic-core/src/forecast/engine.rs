use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::statements::free_cash_flow::{calculate_free_cash_flow, FreeCashFlowInput};
use crate::statements::ratios::RatioProfile;
use crate::statements::record::{FinancialRecord, StatementLine};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::IntrinsicResult;

use super::scenario::{Scenario, ScenarioSet, DEFAULT_SCENARIO_SPREAD};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for the multi-scenario FCF projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    /// Last historical fiscal year; the first forecast year is `base_year + 1`
    pub base_year: i32,
    /// Revenue of the base year, shared by all scenario tracks
    pub base_revenue: Money,
    /// Neutral-outlook annual revenue growth
    pub growth_rate: Rate,
    /// Number of explicit forecast years
    pub forecast_years: u32,
    /// Growth added to the positive outlook and removed from the negative one
    #[serde(default = "default_scenario_spread")]
    pub scenario_spread: Rate,
    /// Statement-line ratios to revenue
    pub profile: RatioProfile,
}

fn default_scenario_spread() -> Rate {
    DEFAULT_SCENARIO_SPREAD
}

impl ForecastInput {
    /// Seed the forecast from the last reported year.
    pub fn seeded_from(
        latest: &FinancialRecord,
        profile: RatioProfile,
        growth_rate: Rate,
        forecast_years: u32,
        scenario_spread: Rate,
    ) -> IntrinsicResult<Self> {
        Ok(Self {
            base_year: latest.year,
            base_revenue: latest.line(StatementLine::Revenue)?,
            growth_rate,
            forecast_years,
            scenario_spread,
            profile,
        })
    }
}

/// Revenue and FCF of one scenario track in one forecast year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPoint {
    pub revenue: Money,
    pub fcf: Money,
}

/// One forecast year across all scenario tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub year: i32,
    pub scenarios: ScenarioSet<ScenarioPoint>,
}

/// The projection: forecast-horizon rows only, the base year is not included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcfForecast {
    pub base_year: i32,
    pub base_revenue: Money,
    pub growth_rate: Rate,
    pub scenario_spread: Rate,
    pub rows: Vec<ForecastRow>,
}

impl FcfForecast {
    pub fn horizon(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn fcf_series(&self, scenario: Scenario) -> Vec<Money> {
        self.rows.iter().map(|r| r.scenarios[scenario].fcf).collect()
    }

    pub fn revenue_series(&self, scenario: Scenario) -> Vec<Money> {
        self.rows.iter().map(|r| r.scenarios[scenario].revenue).collect()
    }

    pub fn final_row(&self) -> Option<&ForecastRow> {
        self.rows.last()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project FCF for the neutral, positive and negative outlooks.
pub fn forecast_free_cash_flows(
    input: &ForecastInput,
) -> IntrinsicResult<ComputationOutput<FcfForecast>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let forecast = project(input)?;

    for scenario in Scenario::ALL {
        if growth_factor(input, scenario)? <= Decimal::ZERO {
            warnings.push(format!(
                "Growth in the {scenario} outlook is -100% or lower; projected revenue turns zero or negative"
            ));
        }
    }

    if let Some(last) = forecast.final_row() {
        for (scenario, point) in last.scenarios.iter() {
            if point.fcf < Decimal::ZERO {
                warnings.push(format!(
                    "Final-year FCF is negative in the {scenario} outlook; terminal value will be negative"
                ));
            }
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Ratio-to-revenue FCF projection (neutral / positive / negative outlooks)",
        input,
        warnings,
        elapsed,
        forecast,
    ))
}

/// Run the year-by-year recurrence.
///
/// Row *n* depends only on row *n−1* and the ratio profile. Any failure discards
/// the whole projection; partial rows are never returned.
pub fn project(input: &ForecastInput) -> IntrinsicResult<FcfForecast> {
    validate_forecast_input(input)?;

    let growth_factors = ScenarioSet::try_from_fn(|s| growth_factor(input, s))?;

    let mut rows: Vec<ForecastRow> = Vec::new();
    let mut previous_revenue = ScenarioSet::uniform(input.base_revenue);

    for step in 1..=input.forecast_years {
        let year = i32::try_from(step)
            .ok()
            .and_then(|s| input.base_year.checked_add(s))
            .ok_or_else(|| IntrinsicError::InvalidParameter {
                field: "forecast_years".into(),
                reason: format!("Horizon of {} years runs past the last representable year", input.forecast_years),
            })?;

        let scenarios = ScenarioSet::try_from_fn(|s| {
            let prev = previous_revenue[s];
            let revenue = arith::mul(prev, growth_factors[s], "projected revenue")?;
            let flow = calculate_free_cash_flow(&FreeCashFlowInput::from_profile(
                &input.profile,
                revenue,
                prev,
            )?)?;
            Ok(ScenarioPoint {
                revenue,
                fcf: flow.fcf,
            })
        })?;

        tracing::debug!(
            year,
            neutral_fcf = %scenarios.neutral.fcf,
            positive_fcf = %scenarios.positive.fcf,
            negative_fcf = %scenarios.negative.fcf,
            "forecast year projected"
        );

        previous_revenue = scenarios.map(|_, p| p.revenue);
        rows.push(ForecastRow { year, scenarios });
    }

    Ok(FcfForecast {
        base_year: input.base_year,
        base_revenue: input.base_revenue,
        growth_rate: input.growth_rate,
        scenario_spread: input.scenario_spread,
        rows,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_forecast_input(input: &ForecastInput) -> IntrinsicResult<()> {
    if input.forecast_years == 0 {
        return Err(IntrinsicError::InvalidParameter {
            field: "forecast_years".into(),
            reason: "Forecast horizon must be at least one year".into(),
        });
    }
    if input.base_revenue <= Decimal::ZERO {
        return Err(IntrinsicError::InvalidParameter {
            field: "base_revenue".into(),
            reason: "Seed revenue must be positive".into(),
        });
    }
    if input.growth_rate <= dec!(-1) {
        return Err(IntrinsicError::InvalidParameter {
            field: "growth_rate".into(),
            reason: "Growth rate must be greater than -100%".into(),
        });
    }
    if input.scenario_spread < Decimal::ZERO {
        return Err(IntrinsicError::InvalidParameter {
            field: "scenario_spread".into(),
            reason: "Scenario spread cannot be negative".into(),
        });
    }
    Ok(())
}

/// `1 + growth + offset`. Only the neutral track is guaranteed positive; a wide
/// spread can push the negative track to zero or below.
fn growth_factor(input: &ForecastInput, scenario: Scenario) -> IntrinsicResult<Decimal> {
    let growth = arith::add(
        input.growth_rate,
        scenario.offset(input.scenario_spread),
        "scenario growth rate",
    )?;
    arith::add(Decimal::ONE, growth, "scenario growth factor")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
