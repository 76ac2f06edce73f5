use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::forecast::engine::FcfForecast;
use crate::forecast::scenario::{Scenario, ScenarioSet};
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::IntrinsicResult;

pub const DEFAULT_PERPETUITY_GROWTH: Rate = dec!(0.02);

/// Terminal value share of EV above which a warning is raised.
const TERMINAL_VALUE_CONCENTRATION: Rate = dec!(0.75);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Capital-structure and discounting inputs applied to every scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationInput {
    pub wacc: Rate,
    pub cash_and_equivalents: Money,
    pub total_debt: Money,
    pub shares_outstanding: Decimal,
    #[serde(default = "default_perpetuity_growth")]
    pub perpetuity_growth_rate: Rate,
}

fn default_perpetuity_growth() -> Rate {
    DEFAULT_PERPETUITY_GROWTH
}

/// Valuation of one scenario track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioValuation {
    /// Present value of the explicit forecast FCFs
    pub npv_fcf: Money,
    /// Gordon growth value at the end of the horizon (undiscounted)
    pub terminal_value: Money,
    pub discounted_terminal_value: Money,
    pub enterprise_value: Money,
    /// EV + cash − debt
    pub equity_value: Money,
    pub estimated_price_per_share: Money,
    /// Discounted terminal value / EV
    pub terminal_value_pct: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationOutput {
    pub scenarios: ScenarioSet<ScenarioValuation>,
    pub wacc_used: Rate,
    pub perpetuity_growth_rate: Rate,
    pub forecast_years: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value every scenario track of a forecast. Either all three succeed or
/// the whole valuation fails.
pub fn value_forecast(
    forecast: &FcfForecast,
    input: &ValuationInput,
) -> IntrinsicResult<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if forecast.rows.is_empty() {
        return Err(IntrinsicError::InvalidParameter {
            field: "forecast".into(),
            reason: "Forecast has no rows to value".into(),
        });
    }

    let scenarios =
        ScenarioSet::try_from_fn(|s| value_fcf_series(&forecast.fcf_series(s), input))?;

    for (scenario, v) in scenarios.iter() {
        if v.terminal_value_pct > TERMINAL_VALUE_CONCENTRATION {
            warnings.push(format!(
                "{} outlook: terminal value is {}% of enterprise value",
                scenario,
                (v.terminal_value_pct * dec!(100)).round_dp(1)
            ));
        }
        if v.estimated_price_per_share < Decimal::ZERO {
            warnings.push(format!(
                "{} outlook: negative estimated price per share ({})",
                scenario,
                v.estimated_price_per_share.round_dp(2)
            ));
        }
    }

    let output = ValuationOutput {
        scenarios,
        wacc_used: input.wacc,
        perpetuity_growth_rate: input.perpetuity_growth_rate,
        forecast_years: forecast.horizon(),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "DCF: NPV of explicit FCF plus Gordon growth terminal value, per scenario",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Value a single ordered FCF series (forecast years only, base year excluded).
pub fn value_fcf_series(fcfs: &[Money], input: &ValuationInput) -> IntrinsicResult<ScenarioValuation> {
    if input.shares_outstanding <= Decimal::ZERO {
        return Err(IntrinsicError::DivisionByZero {
            context: "price per share (shares outstanding must be positive)".into(),
        });
    }
    let final_fcf = fcfs.last().copied().ok_or_else(|| IntrinsicError::InvalidParameter {
        field: "fcf_series".into(),
        reason: "At least one forecast year is required".into(),
    })?;

    let npv_fcf = time_value::npv(input.wacc, fcfs)?;
    let terminal_value = terminal_value(final_fcf, input.wacc, input.perpetuity_growth_rate)?;
    let horizon = fcfs.len() as u32;
    let discounted_terminal_value = time_value::present_value(terminal_value, input.wacc, horizon)?;

    let enterprise_value = arith::add(npv_fcf, discounted_terminal_value, "enterprise value")?;
    let equity_value = arith::sub(
        arith::add(enterprise_value, input.cash_and_equivalents, "equity value")?,
        input.total_debt,
        "equity value",
    )?;
    let estimated_price_per_share =
        arith::safe_divide(equity_value, input.shares_outstanding, "price per share")?;
    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        arith::safe_divide(discounted_terminal_value, enterprise_value, "terminal value share")?
    };

    tracing::debug!(
        npv_fcf = %npv_fcf,
        enterprise_value = %enterprise_value,
        price_per_share = %estimated_price_per_share,
        "scenario valued"
    );

    Ok(ScenarioValuation {
        npv_fcf,
        terminal_value,
        discounted_terminal_value,
        enterprise_value,
        equity_value,
        estimated_price_per_share,
        terminal_value_pct,
    })
}

/// Gordon growth terminal value `FCF_T · (1+g) / (WACC − g)`.
pub fn terminal_value(final_fcf: Money, wacc: Rate, growth: Rate) -> IntrinsicResult<Money> {
    if wacc <= growth {
        return Err(IntrinsicError::InvalidParameter {
            field: "perpetuity_growth_rate".into(),
            reason: format!("WACC ({wacc}) must exceed perpetuity growth ({growth})"),
        });
    }
    let grown = arith::mul(
        final_fcf,
        arith::add(Decimal::ONE, growth, "terminal value")?,
        "terminal value",
    )?;
    arith::safe_divide(grown, arith::sub(wacc, growth, "terminal value")?, "terminal value")
}

/// Price per share of one scenario.
pub fn price_per_share(output: &ValuationOutput, scenario: Scenario) -> Money {
    output.scenarios[scenario].estimated_price_per_share
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
