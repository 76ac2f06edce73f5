use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::{Money, Rate};
use crate::IntrinsicResult;

/// Present value of a single amount received `periods` periods from now:
/// `amount / (1 + rate)^periods`.
///
/// Divides by the compounded rate rather than multiplying by a rounded factor.
pub fn present_value(amount: Money, rate: Rate, periods: u32) -> IntrinsicResult<Money> {
    validate_rate(rate)?;
    let one_plus_r = arith::add(Decimal::ONE, rate, "present value")?;
    let compounded = arith::powi(one_plus_r, periods, "present value")?;
    arith::safe_divide(amount, compounded, "present value")
}

/// Net Present Value of a series of end-of-period cash flows.
///
/// The first flow is discounted one full period: `Σ CF_t / (1+r)^t` for t = 1..n.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> IntrinsicResult<Money> {
    validate_rate(rate)?;

    let one_plus_r = arith::add(Decimal::ONE, rate, "NPV discount")?;
    let mut discount = Decimal::ONE;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        discount = arith::mul(discount, one_plus_r, "NPV discount")?;
        let pv = arith::safe_divide(*cf, discount, &format!("NPV discount factor at period {}", t + 1))?;
        result = arith::add(result, pv, "NPV sum")?;
    }

    Ok(result)
}

fn validate_rate(rate: Rate) -> IntrinsicResult<()> {
    if rate <= dec!(-1) {
        return Err(IntrinsicError::InvalidParameter {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(110), dec!(121)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // 110/1.1 + 121/1.21 = 100 + 100
        assert_eq!(result, dec!(200));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(150));
    }

    #[test]
    fn test_npv_empty() {
        assert_eq!(npv(dec!(0.08), &[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_present_value() {
        // 100 / 1.25^2
        assert_eq!(present_value(dec!(100), dec!(0.25), 2).unwrap(), dec!(64));
        assert_eq!(present_value(dec!(100), dec!(0.25), 0).unwrap(), dec!(100));
    }

    #[test]
    fn test_extreme_rate_is_non_finite() {
        assert!(matches!(
            npv(Decimal::MAX, &[dec!(1)]),
            Err(IntrinsicError::NonFiniteResult { .. })
        ));
    }

    #[test]
    fn test_rate_below_minus_one_rejected() {
        assert!(npv(dec!(-1), &[dec!(1)]).is_err());
        assert!(present_value(dec!(1), dec!(-1.5), 1).is_err());
    }
}
