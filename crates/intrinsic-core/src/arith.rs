//! Checked decimal arithmetic.
//!
//! Decimal has no NaN or infinity; overflow is the only way a value stops being
//! representable, so every helper maps it to `NonFiniteResult`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::IntrinsicError;
use crate::IntrinsicResult;

pub(crate) fn safe_divide(
    numerator: Decimal,
    denominator: Decimal,
    context: &str,
) -> IntrinsicResult<Decimal> {
    if denominator.is_zero() {
        return Err(IntrinsicError::DivisionByZero {
            context: context.to_string(),
        });
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| non_finite(context))
}

pub(crate) fn mul(a: Decimal, b: Decimal, context: &str) -> IntrinsicResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| non_finite(context))
}

pub(crate) fn add(a: Decimal, b: Decimal, context: &str) -> IntrinsicResult<Decimal> {
    a.checked_add(b).ok_or_else(|| non_finite(context))
}

pub(crate) fn sub(a: Decimal, b: Decimal, context: &str) -> IntrinsicResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| non_finite(context))
}

pub(crate) fn powi(base: Decimal, exp: u32, context: &str) -> IntrinsicResult<Decimal> {
    base.checked_powi(i64::from(exp))
        .ok_or_else(|| non_finite(context))
}

/// Sum a series, failing on overflow instead of panicking.
pub(crate) fn sum(values: impl IntoIterator<Item = Decimal>, context: &str) -> IntrinsicResult<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| add(acc, v, context))
}

/// Arithmetic mean; an empty series is a division by zero.
pub(crate) fn mean(values: &[Decimal], context: &str) -> IntrinsicResult<Decimal> {
    let total = sum(values.iter().copied(), context)?;
    safe_divide(total, Decimal::from(values.len() as u64), context)
}

fn non_finite(context: &str) -> IntrinsicError {
    IntrinsicError::NonFiniteResult {
        context: context.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_safe_divide_zero() {
        let err = safe_divide(dec!(1), Decimal::ZERO, "ratio").unwrap_err();
        assert!(matches!(err, IntrinsicError::DivisionByZero { .. }));
    }

    #[test]
    fn test_overflow_is_non_finite() {
        let err = mul(Decimal::MAX, dec!(2), "scale").unwrap_err();
        assert!(matches!(err, IntrinsicError::NonFiniteResult { .. }));
    }

    #[test]
    fn test_mean() {
        let m = mean(&[dec!(1), dec!(2), dec!(6)], "mean").unwrap();
        assert_eq!(m, dec!(3));
        assert!(mean(&[], "mean").is_err());
    }
}
