use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::IntrinsicResult;

const HIGH_WACC: Rate = dec!(0.20);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccInput {
    /// Pre-tax cost of debt
    pub cost_of_debt: Rate,
    pub cost_of_equity: Rate,
    pub tax_rate: Rate,
    pub total_debt: Money,
    /// Market value of equity (market capitalisation)
    pub total_equity: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccOutput {
    pub wacc: Rate,
    pub debt_weight: Rate,
    pub equity_weight: Rate,
    pub after_tax_cost_of_debt: Rate,
    pub cost_of_equity: Rate,
}

/// Weighted average cost of capital:
/// `D/(D+E) · kd · (1 − t) + E/(D+E) · ke`.
pub fn calculate_wacc(input: &WaccInput) -> IntrinsicResult<ComputationOutput<WaccOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_wacc_input(input)?;

    let total_capital = arith::add(input.total_debt, input.total_equity, "total capital")?;
    if total_capital <= Decimal::ZERO {
        return Err(IntrinsicError::DivisionByZero {
            context: "WACC capital weights (debt + equity is not positive)".into(),
        });
    }

    let debt_weight = arith::safe_divide(input.total_debt, total_capital, "debt weight")?;
    let equity_weight = arith::sub(Decimal::ONE, debt_weight, "equity weight")?;
    let after_tax_cost_of_debt = arith::mul(
        input.cost_of_debt,
        Decimal::ONE - input.tax_rate,
        "after-tax cost of debt",
    )?;

    let wacc = arith::add(
        arith::mul(debt_weight, after_tax_cost_of_debt, "WACC debt component")?,
        arith::mul(equity_weight, input.cost_of_equity, "WACC equity component")?,
        "WACC",
    )?;

    if wacc > HIGH_WACC {
        warnings.push(format!(
            "WACC of {}% is unusually high",
            (wacc * dec!(100)).round_dp(2)
        ));
    }
    if input.total_equity < Decimal::ZERO {
        warnings.push(format!(
            "Equity value of {} is negative; debt weight exceeds 100%",
            input.total_equity
        ));
    }
    if input.total_debt.is_zero() {
        warnings.push("Company carries no debt; WACC equals the cost of equity".into());
    }

    tracing::debug!(
        wacc = %wacc,
        debt_weight = %debt_weight,
        "weighted average cost of capital"
    );

    let output = WaccOutput {
        wacc,
        debt_weight,
        equity_weight,
        after_tax_cost_of_debt,
        cost_of_equity: input.cost_of_equity,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Market-value weighted average cost of capital",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_wacc_input(input: &WaccInput) -> IntrinsicResult<()> {
    if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE {
        return Err(IntrinsicError::InvalidParameter {
            field: "tax_rate".into(),
            reason: "Tax rate must be between 0 and 1".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WaccInput {
        WaccInput {
            cost_of_debt: dec!(0.06),
            cost_of_equity: dec!(0.10),
            tax_rate: dec!(0.25),
            total_debt: dec!(400),
            total_equity: dec!(600),
        }
    }

    #[test]
    fn test_wacc_blend() {
        let out = calculate_wacc(&sample()).unwrap().result;
        // 0.4 * 0.045 + 0.6 * 0.10 = 0.018 + 0.06
        assert_eq!(out.debt_weight, dec!(0.4));
        assert_eq!(out.equity_weight, dec!(0.6));
        assert_eq!(out.after_tax_cost_of_debt, dec!(0.045));
        assert_eq!(out.wacc, dec!(0.078));
    }

    #[test]
    fn test_wacc_between_components() {
        let out = calculate_wacc(&sample()).unwrap().result;
        assert!(out.wacc > out.after_tax_cost_of_debt);
        assert!(out.wacc < out.cost_of_equity);
    }

    #[test]
    fn test_all_equity() {
        let mut input = sample();
        input.total_debt = Decimal::ZERO;
        let out = calculate_wacc(&input).unwrap();
        assert_eq!(out.result.wacc, dec!(0.10));
        assert!(out.warnings.iter().any(|w| w.contains("no debt")));
    }

    #[test]
    fn test_zero_capital() {
        let mut input = sample();
        input.total_debt = Decimal::ZERO;
        input.total_equity = Decimal::ZERO;
        assert!(matches!(
            calculate_wacc(&input),
            Err(IntrinsicError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_negative_equity_weighted() {
        let mut input = sample();
        input.total_debt = dec!(1000);
        input.total_equity = dec!(-200);
        let out = calculate_wacc(&input).unwrap();
        // D/(D+E) = 1000/800
        assert_eq!(out.result.debt_weight, dec!(1.25));
        assert_eq!(out.result.equity_weight, dec!(-0.25));
        // 1.25 * 0.045 - 0.25 * 0.10
        assert_eq!(out.result.wacc, dec!(0.03125));
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn test_negative_total_capital() {
        let mut input = sample();
        input.total_debt = dec!(100);
        input.total_equity = dec!(-300);
        assert!(matches!(
            calculate_wacc(&input),
            Err(IntrinsicError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_invalid_tax_rate() {
        let mut input = sample();
        input.tax_rate = dec!(1.2);
        assert!(matches!(
            calculate_wacc(&input),
            Err(IntrinsicError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_high_wacc_warning() {
        let mut input = sample();
        input.cost_of_equity = dec!(0.40);
        let out = calculate_wacc(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("unusually high")));
    }
}
