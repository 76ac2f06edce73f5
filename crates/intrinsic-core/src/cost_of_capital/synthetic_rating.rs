use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::IntrinsicResult;

// ---------------------------------------------------------------------------
// Rating table
// ---------------------------------------------------------------------------

/// Synthetic credit rating implied by interest coverage, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SyntheticRating {
    D,
    C,
    CC,
    CCC,
    #[serde(rename = "B-")]
    Bm,
    B,
    #[serde(rename = "B+")]
    Bp,
    BB,
    #[serde(rename = "BB+")]
    BBp,
    BBB,
    #[serde(rename = "A-")]
    Am,
    A,
    #[serde(rename = "A+")]
    Ap,
    AA,
    AAA,
}

impl std::fmt::Display for SyntheticRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::D => "D",
            Self::C => "C",
            Self::CC => "CC",
            Self::CCC => "CCC",
            Self::Bm => "B-",
            Self::B => "B",
            Self::Bp => "B+",
            Self::BB => "BB",
            Self::BBp => "BB+",
            Self::BBB => "BBB",
            Self::Am => "A-",
            Self::A => "A",
            Self::Ap => "A+",
            Self::AA => "AA",
            Self::AAA => "AAA",
        };
        write!(f, "{}", s)
    }
}

impl SyntheticRating {
    /// Credit default spread over the risk-free rate.
    pub fn spread(self) -> Rate {
        match self {
            Self::D => dec!(0.1434),
            Self::C => dec!(0.1076),
            Self::CC => dec!(0.088),
            Self::CCC => dec!(0.0778),
            Self::Bm => dec!(0.0462),
            Self::B => dec!(0.0378),
            Self::Bp => dec!(0.0315),
            Self::BB => dec!(0.0215),
            Self::BBp => dec!(0.0193),
            Self::BBB => dec!(0.0159),
            Self::Am => dec!(0.0129),
            Self::A => dec!(0.014),
            Self::Ap => dec!(0.0103),
            Self::AA => dec!(0.0082),
            Self::AAA => dec!(0.0067),
        }
    }
}

struct RatingBucket {
    /// Inclusive upper bound of interest coverage; `None` is unbounded
    upper_bound: Option<Multiple>,
    rating: SyntheticRating,
}

/// Buckets are left-open and right-closed: a coverage exactly on a threshold
/// belongs to the lower bucket.
const RATING_TABLE: [RatingBucket; 15] = [
    RatingBucket { upper_bound: Some(dec!(0.5)), rating: SyntheticRating::D },
    RatingBucket { upper_bound: Some(dec!(0.8)), rating: SyntheticRating::C },
    RatingBucket { upper_bound: Some(dec!(1.25)), rating: SyntheticRating::CC },
    RatingBucket { upper_bound: Some(dec!(1.5)), rating: SyntheticRating::CCC },
    RatingBucket { upper_bound: Some(dec!(2)), rating: SyntheticRating::Bm },
    RatingBucket { upper_bound: Some(dec!(2.5)), rating: SyntheticRating::B },
    RatingBucket { upper_bound: Some(dec!(3)), rating: SyntheticRating::Bp },
    RatingBucket { upper_bound: Some(dec!(3.5)), rating: SyntheticRating::BB },
    RatingBucket { upper_bound: Some(dec!(4)), rating: SyntheticRating::BBp },
    RatingBucket { upper_bound: Some(dec!(4.5)), rating: SyntheticRating::BBB },
    RatingBucket { upper_bound: Some(dec!(6)), rating: SyntheticRating::Am },
    RatingBucket { upper_bound: Some(dec!(7.5)), rating: SyntheticRating::A },
    RatingBucket { upper_bound: Some(dec!(9.5)), rating: SyntheticRating::Ap },
    RatingBucket { upper_bound: Some(dec!(12.5)), rating: SyntheticRating::AA },
    RatingBucket { upper_bound: None, rating: SyntheticRating::AAA },
];

/// Map an interest coverage ratio to its rating and spread.
pub fn rating_for_coverage(coverage: Multiple) -> (SyntheticRating, Rate) {
    let bucket = RATING_TABLE
        .iter()
        .find(|b| b.upper_bound.map_or(true, |upper| coverage <= upper))
        .unwrap_or(&RATING_TABLE[RATING_TABLE.len() - 1]);
    (bucket.rating, bucket.rating.spread())
}

// ---------------------------------------------------------------------------
// Cost of debt
// ---------------------------------------------------------------------------

/// Inputs for the synthetic-rating cost of debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostOfDebtInput {
    pub ebitda: Money,
    pub depreciation_and_amortization: Money,
    pub interest_expense: Money,
    pub risk_free_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOfDebtOutput {
    /// (EBITDA − D&A) / interest expense
    pub interest_coverage: Multiple,
    pub rating: SyntheticRating,
    pub credit_spread: Rate,
    /// Credit spread + risk-free rate (pre-tax)
    pub cost_of_debt: Rate,
}

/// Pre-tax cost of debt from an interest-coverage synthetic rating.
pub fn estimate_cost_of_debt(
    input: &CostOfDebtInput,
) -> IntrinsicResult<ComputationOutput<CostOfDebtOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.interest_expense <= Decimal::ZERO {
        return Err(IntrinsicError::DivisionByZero {
            context: "interest coverage (interest expense must be positive)".into(),
        });
    }

    let ebit = arith::sub(input.ebitda, input.depreciation_and_amortization, "EBIT")?;
    let interest_coverage = arith::safe_divide(ebit, input.interest_expense, "interest coverage")?;
    let (rating, credit_spread) = rating_for_coverage(interest_coverage);
    let cost_of_debt = arith::add(credit_spread, input.risk_free_rate, "cost of debt")?;

    if rating == SyntheticRating::D {
        warnings.push(format!(
            "Interest coverage {}x is in the default bucket",
            interest_coverage.round_dp(2)
        ));
    }
    if rating == SyntheticRating::AAA {
        warnings.push(format!(
            "Interest coverage {}x exceeds 12.5x; rating capped at AAA",
            interest_coverage.round_dp(2)
        ));
    }

    tracing::debug!(
        interest_coverage = %interest_coverage,
        rating = %rating,
        cost_of_debt = %cost_of_debt,
        "synthetic rating assigned"
    );

    let output = CostOfDebtOutput {
        interest_coverage,
        rating,
        credit_spread,
        cost_of_debt,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Synthetic rating from interest coverage (EBIT / interest)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_belongs_to_lower_bucket() {
        assert_eq!(rating_for_coverage(dec!(2.0)).0, SyntheticRating::Bm);
        assert_eq!(rating_for_coverage(dec!(2.0001)).0, SyntheticRating::B);
        assert_eq!(rating_for_coverage(dec!(0.5)).0, SyntheticRating::D);
        assert_eq!(rating_for_coverage(dec!(12.5)).0, SyntheticRating::AA);
        assert_eq!(rating_for_coverage(dec!(12.51)).0, SyntheticRating::AAA);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(rating_for_coverage(dec!(-3)).0, SyntheticRating::D);
        assert_eq!(rating_for_coverage(dec!(1000)).0, SyntheticRating::AAA);
    }

    #[test]
    fn test_table_is_ascending() {
        let bounds: Vec<Decimal> = RATING_TABLE.iter().filter_map(|b| b.upper_bound).collect();
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        let ratings: Vec<SyntheticRating> = RATING_TABLE.iter().map(|b| b.rating).collect();
        assert!(ratings.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_spread_lookup() {
        assert_eq!(SyntheticRating::D.spread(), dec!(0.1434));
        assert_eq!(SyntheticRating::A.spread(), dec!(0.014));
        assert_eq!(SyntheticRating::AAA.spread(), dec!(0.0067));
    }

    #[test]
    fn test_every_table_rating_has_spread() {
        for bucket in &RATING_TABLE {
            assert!(bucket.rating.spread() > Decimal::ZERO, "{}", bucket.rating);
        }
        assert_eq!(rating_for_coverage(dec!(3.2)), (SyntheticRating::BB, dec!(0.0215)));
    }

    #[test]
    fn test_cost_of_debt() {
        let input = CostOfDebtInput {
            ebitda: dec!(500),
            depreciation_and_amortization: dec!(100),
            interest_expense: dec!(80),
            risk_free_rate: dec!(0.04),
        };
        let out = estimate_cost_of_debt(&input).unwrap().result;
        // (500 - 100) / 80 = 5.0 -> A- bucket (4.5, 6]
        assert_eq!(out.interest_coverage, dec!(5));
        assert_eq!(out.rating, SyntheticRating::Am);
        assert_eq!(out.credit_spread, dec!(0.0129));
        assert_eq!(out.cost_of_debt, dec!(0.0529));
    }

    #[test]
    fn test_zero_interest_rejected() {
        let input = CostOfDebtInput {
            ebitda: dec!(500),
            depreciation_and_amortization: dec!(100),
            interest_expense: Decimal::ZERO,
            risk_free_rate: dec!(0.04),
        };
        assert!(matches!(
            estimate_cost_of_debt(&input),
            Err(IntrinsicError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_rating_display_and_serde() {
        assert_eq!(SyntheticRating::BBp.to_string(), "BB+");
        assert_eq!(serde_json::to_string(&SyntheticRating::Am).unwrap(), "\"A-\"");
    }
}
