use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::IntrinsicResult;

use super::record::{FinancialHistory, FinancialRecord, StatementLine};

/// Default number of most-recent fiscal years averaged.
pub const DEFAULT_GROWTH_WINDOW: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Retention × ROE for a single fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthYear {
    pub year: i32,
    pub retention_ratio: Rate,
    pub return_on_equity: Rate,
    pub growth: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEstimate {
    /// Arithmetic mean of retention × ROE over the window
    pub growth_rate: Rate,
    pub years: Vec<GrowthYear>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Estimate net-income growth from the most recent `window_years` of history.
///
/// growth = mean(retention × ROE), retention = 1 − |dividends| / net income,
/// ROE = net income / (total assets − total liabilities).
pub fn estimate_growth_rate(
    history: &FinancialHistory,
    window_years: usize,
) -> IntrinsicResult<ComputationOutput<GrowthEstimate>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if window_years == 0 {
        return Err(IntrinsicError::InvalidParameter {
            field: "growth_window_years".into(),
            reason: "Growth window must cover at least one year".into(),
        });
    }

    let window = history.most_recent(window_years);
    if window.len() < window_years {
        warnings.push(format!(
            "Requested {window_years} years of growth history; only {} available",
            window.len()
        ));
    }

    let estimate = growth_from_records(window)?;

    for y in &estimate.years {
        if y.retention_ratio < Decimal::ZERO || y.retention_ratio > Decimal::ONE {
            warnings.push(format!(
                "Retention ratio {} in fiscal year {} is outside [0, 1]",
                y.retention_ratio.round_dp(4),
                y.year
            ));
        }
    }

    tracing::debug!(
        growth_rate = %estimate.growth_rate,
        years = estimate.years.len(),
        "growth rate estimated"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "window_years": window_years,
        "years": window.iter().map(|r| r.year).collect::<Vec<_>>(),
    });
    Ok(with_metadata(
        "Sustainable growth: mean(retention ratio × ROE)",
        &assumptions,
        warnings,
        elapsed,
        estimate,
    ))
}

/// Retention × ROE for each record, averaged.
pub fn growth_from_records(records: &[FinancialRecord]) -> IntrinsicResult<GrowthEstimate> {
    if records.is_empty() {
        return Err(IntrinsicError::InvalidParameter {
            field: "records".into(),
            reason: "Growth estimation needs at least one fiscal year".into(),
        });
    }

    let years = records
        .iter()
        .map(|r| {
            let net_income = r.line(StatementLine::NetIncome)?;
            let dividends = r.line(StatementLine::DividendsPaid)?;
            let book_equity = r.book_value_of_equity()?;
            growth_year(r.year, dividends, net_income, book_equity)
        })
        .collect::<IntrinsicResult<Vec<_>>>()?;

    let growths: Vec<Rate> = years.iter().map(|y| y.growth).collect();
    let growth_rate = arith::mean(&growths, "mean growth")?;

    Ok(GrowthEstimate { growth_rate, years })
}

/// Mean of retention × ROE over aligned series (one entry per year).
pub fn average_sustainable_growth(
    dividends_paid: &[Money],
    net_income: &[Money],
    book_value_of_equity: &[Money],
) -> IntrinsicResult<Rate> {
    let n = net_income.len();
    if n == 0 {
        return Err(IntrinsicError::InvalidParameter {
            field: "net_income".into(),
            reason: "Growth estimation needs at least one year".into(),
        });
    }
    if dividends_paid.len() != n || book_value_of_equity.len() != n {
        return Err(IntrinsicError::InvalidParameter {
            field: "series".into(),
            reason: format!(
                "Series must be aligned: {} dividends, {} net income, {} book equity",
                dividends_paid.len(),
                n,
                book_value_of_equity.len()
            ),
        });
    }

    let growths = (0..n)
        .map(|i| {
            growth_year(i as i32, dividends_paid[i], net_income[i], book_value_of_equity[i])
                .map(|y| y.growth)
        })
        .collect::<IntrinsicResult<Vec<_>>>()?;
    arith::mean(&growths, "mean growth")
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn growth_year(
    year: i32,
    dividends_paid: Money,
    net_income: Money,
    book_value_of_equity: Money,
) -> IntrinsicResult<GrowthYear> {
    // Dividends are an outflow; either sign convention yields the same payout.
    let payout = arith::safe_divide(
        dividends_paid.abs(),
        net_income,
        &format!("payout ratio (net income) for year {year}"),
    )?;
    let retention_ratio = arith::sub(Decimal::ONE, payout, "retention ratio")?;
    let return_on_equity = arith::safe_divide(
        net_income,
        book_value_of_equity,
        &format!("return on equity (book value of equity) for year {year}"),
    )?;
    let growth = arith::mul(retention_ratio, return_on_equity, "retention × ROE")?;

    Ok(GrowthYear {
        year,
        retention_ratio,
        return_on_equity,
        growth,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(year: i32, ni: Decimal, div: Decimal, assets: Decimal, liabilities: Decimal) -> FinancialRecord {
        FinancialRecord {
            net_income: Some(ni),
            dividends_paid: Some(div),
            total_assets: Some(assets),
            total_liabilities: Some(liabilities),
            ..FinancialRecord::new(year)
        }
    }

    #[test]
    fn test_single_year_growth() {
        // retention = 1 - 40/100 = 0.6, ROE = 100/500 = 0.2, g = 0.12
        let est = growth_from_records(&[record(2021, dec!(100), dec!(-40), dec!(900), dec!(400))]).unwrap();
        assert_eq!(est.growth_rate, dec!(0.12));
        assert_eq!(est.years[0].retention_ratio, dec!(0.6));
        assert_eq!(est.years[0].return_on_equity, dec!(0.2));
    }

    #[test]
    fn test_dividend_sign_convention_irrelevant() {
        let neg = growth_from_records(&[record(2021, dec!(100), dec!(-25), dec!(800), dec!(300))]).unwrap();
        let pos = growth_from_records(&[record(2021, dec!(100), dec!(25), dec!(800), dec!(300))]).unwrap();
        assert_eq!(neg.growth_rate, pos.growth_rate);
    }

    #[test]
    fn test_mean_over_years() {
        let est = growth_from_records(&[
            // 1.0 * 0.1 = 0.1
            record(2020, dec!(50), dec!(0), dec!(1000), dec!(500)),
            // 0.5 * 0.4 = 0.2
            record(2021, dec!(200), dec!(-100), dec!(1000), dec!(500)),
        ])
        .unwrap();
        // (0.1 + 0.2) / 2
        assert_eq!(est.growth_rate, dec!(0.15));
    }

    #[test]
    fn test_zero_net_income_rejected() {
        let err = growth_from_records(&[record(2021, dec!(0), dec!(-10), dec!(500), dec!(100))]).unwrap_err();
        assert!(matches!(err, IntrinsicError::DivisionByZero { .. }));
    }

    #[test]
    fn test_zero_book_equity_rejected() {
        let err = growth_from_records(&[record(2021, dec!(10), dec!(-1), dec!(500), dec!(500))]).unwrap_err();
        assert!(matches!(err, IntrinsicError::DivisionByZero { .. }));
    }

    #[test]
    fn test_series_api_matches_records() {
        let g = average_sustainable_growth(&[dec!(-40)], &[dec!(100)], &[dec!(500)]).unwrap();
        assert_eq!(g, dec!(0.12));
        assert!(average_sustainable_growth(&[dec!(1)], &[dec!(1), dec!(2)], &[dec!(1)]).is_err());
    }

    #[test]
    fn test_window_limits_years() {
        let history = FinancialHistory::new(vec![
            record(2019, dec!(100), dec!(0), dec!(200), dec!(100)),
            record(2020, dec!(50), dec!(0), dec!(1000), dec!(500)),
            record(2021, dec!(50), dec!(0), dec!(1000), dec!(500)),
        ])
        .unwrap();
        let out = estimate_growth_rate(&history, 2).unwrap();
        assert_eq!(out.result.years.len(), 2);
        assert_eq!(out.result.growth_rate, dec!(0.1));
        assert!(estimate_growth_rate(&history, 0).is_err());
    }
}
