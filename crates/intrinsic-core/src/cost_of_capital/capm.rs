use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::IntrinsicResult;

/// Frequency of return observations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl ReturnFrequency {
    /// Number of periods in a year for annualisation
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            ReturnFrequency::Daily => dec!(252),
            ReturnFrequency::Weekly => dec!(52),
            ReturnFrequency::Monthly => dec!(12),
            ReturnFrequency::Quarterly => dec!(4),
            ReturnFrequency::Annual => dec!(1),
        }
    }
}

/// Input for the CAPM cost-of-equity estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapmInput {
    /// Company periodic returns, aligned with `index_returns`
    pub company_returns: Vec<Rate>,
    /// Market index periodic returns
    pub index_returns: Vec<Rate>,
    /// Annual risk-free rate
    pub risk_free_rate: Rate,
    /// Observation frequency (default: daily)
    #[serde(default)]
    pub frequency: ReturnFrequency,
}

/// Output of the CAPM regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapmOutput {
    /// Slope of company returns on index returns
    pub beta: Decimal,
    /// Regression intercept (periodic alpha)
    pub intercept: Decimal,
    pub r_squared: Decimal,
    /// Mean periodic index return × periods per year
    pub market_return: Rate,
    /// Rf + beta × (market return − Rf)
    pub expected_return: Rate,
    pub observations: usize,
}

/// Estimate the cost of equity with CAPM.
///
/// Beta and intercept come from an OLS regression of company returns on index
/// returns; the annualised market return is the mean periodic index return
/// scaled by the observation frequency.
pub fn estimate_cost_of_equity(input: &CapmInput) -> IntrinsicResult<ComputationOutput<CapmOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let n = input.company_returns.len();
    if n != input.index_returns.len() {
        return Err(IntrinsicError::InvalidParameter {
            field: "company_returns / index_returns".into(),
            reason: format!(
                "Return series must be aligned: {n} company vs {} index observations",
                input.index_returns.len()
            ),
        });
    }
    if n < 2 {
        return Err(IntrinsicError::InvalidParameter {
            field: "company_returns".into(),
            reason: "At least 2 aligned observations required for regression".into(),
        });
    }

    let regression = ols(&input.index_returns, &input.company_returns)?;

    let mean_index = arith::mean(&input.index_returns, "mean index return")?;
    let market_return = arith::mul(
        mean_index,
        input.frequency.periods_per_year(),
        "annualised market return",
    )?;
    let premium = arith::mul(
        regression.slope,
        arith::sub(market_return, input.risk_free_rate, "equity risk premium")?,
        "equity risk premium",
    )?;
    let expected_return = arith::add(input.risk_free_rate, premium, "expected return")?;

    if regression.slope > dec!(3.0) {
        warnings.push(format!(
            "High beta ({}): verify the return series; betas above 3.0 are unusual",
            regression.slope.round_dp(4)
        ));
    }
    if regression.slope < Decimal::ZERO {
        warnings.push("Negative beta: cost of equity falls below the risk-free rate when the market premium is positive".into());
    }
    if regression.r_squared < dec!(0.1) {
        warnings.push(format!(
            "Low R² ({}): the index explains little of the company's return variance",
            regression.r_squared.round_dp(4)
        ));
    }

    tracing::debug!(
        beta = %regression.slope,
        market_return = %market_return,
        expected_return = %expected_return,
        observations = n,
        "CAPM cost of equity estimated"
    );

    let output = CapmOutput {
        beta: regression.slope,
        intercept: regression.intercept,
        r_squared: regression.r_squared,
        market_return,
        expected_return,
        observations: n,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "risk_free_rate": input.risk_free_rate,
        "frequency": input.frequency,
        "observations": n,
    });

    Ok(with_metadata(
        "CAPM: OLS beta vs market index",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Regression {
    slope: Decimal,
    intercept: Decimal,
    r_squared: Decimal,
}

/// Ordinary least squares of `y` on `x` with an intercept.
fn ols(x: &[Decimal], y: &[Decimal]) -> IntrinsicResult<Regression> {
    const CTX: &str = "OLS regression";

    let mean_x = arith::mean(x, CTX)?;
    let mean_y = arith::mean(y, CTX)?;

    let mut sxx = Decimal::ZERO;
    let mut syy = Decimal::ZERO;
    let mut sxy = Decimal::ZERO;
    for (xi, yi) in x.iter().zip(y) {
        let dx = arith::sub(*xi, mean_x, CTX)?;
        let dy = arith::sub(*yi, mean_y, CTX)?;
        sxx = arith::add(sxx, arith::mul(dx, dx, CTX)?, CTX)?;
        syy = arith::add(syy, arith::mul(dy, dy, CTX)?, CTX)?;
        sxy = arith::add(sxy, arith::mul(dx, dy, CTX)?, CTX)?;
    }

    let slope = arith::safe_divide(sxy, sxx, "beta (index returns have zero variance)")?;
    let intercept = arith::sub(mean_y, arith::mul(slope, mean_x, CTX)?, CTX)?;
    let r_squared = if syy.is_zero() {
        Decimal::ZERO
    } else {
        arith::safe_divide(
            arith::mul(sxy, sxy, CTX)?,
            arith::mul(sxx, syy, CTX)?,
            "R squared",
        )?
    };

    Ok(Regression {
        slope,
        intercept,
        r_squared,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
