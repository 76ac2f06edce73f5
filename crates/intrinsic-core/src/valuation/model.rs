//! End-to-end DCF run: statements → forecast → cost of capital → valuation.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cost_of_capital::capm::{estimate_cost_of_equity, CapmInput, CapmOutput, ReturnFrequency};
use crate::cost_of_capital::returns::{align_returns, returns_at_frequency, PricePoint};
use crate::cost_of_capital::synthetic_rating::{estimate_cost_of_debt, CostOfDebtInput, CostOfDebtOutput};
use crate::cost_of_capital::wacc::{calculate_wacc, WaccInput, WaccOutput};
use crate::error::IntrinsicError;
use crate::forecast::engine::{forecast_free_cash_flows, FcfForecast, ForecastInput};
use crate::forecast::scenario::DEFAULT_SCENARIO_SPREAD;
use crate::statements::free_cash_flow::{historical_free_cash_flows, HistoricalFreeCashFlow};
use crate::statements::growth::{estimate_growth_rate, GrowthEstimate, DEFAULT_GROWTH_WINDOW};
use crate::statements::ratios::{build_ratio_profile, RatioProfile, RatioSelection};
use crate::statements::record::{FinancialHistory, StatementLine};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::IntrinsicResult;

use super::dcf::{value_forecast, ValuationInput, ValuationOutput, DEFAULT_PERPETUITY_GROWTH};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tunable model assumptions. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelAssumptions {
    pub forecast_years: u32,
    pub perpetuity_growth_rate: Rate,
    pub scenario_spread: Rate,
    pub ratio_selection: RatioSelection,
    pub growth_window_years: usize,
    pub return_frequency: ReturnFrequency,
    /// Use this growth rate instead of the retention × ROE estimate
    pub growth_rate_override: Option<Rate>,
    /// Use this cost of equity instead of the CAPM regression
    pub cost_of_equity_override: Option<Rate>,
}

impl Default for ModelAssumptions {
    fn default() -> Self {
        Self {
            forecast_years: 5,
            perpetuity_growth_rate: DEFAULT_PERPETUITY_GROWTH,
            scenario_spread: DEFAULT_SCENARIO_SPREAD,
            ratio_selection: RatioSelection::All,
            growth_window_years: DEFAULT_GROWTH_WINDOW,
            return_frequency: ReturnFrequency::Daily,
            growth_rate_override: None,
            cost_of_equity_override: None,
        }
    }
}

/// Market observations for the CAPM regression: raw closing prices or
/// already-aligned periodic returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarketData {
    Prices {
        company_prices: Vec<PricePoint>,
        index_prices: Vec<PricePoint>,
    },
    Returns {
        company_returns: Vec<Rate>,
        index_returns: Vec<Rate>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfModelInput {
    pub history: FinancialHistory,
    #[serde(default)]
    pub market_data: Option<MarketData>,
    pub risk_free_rate: Rate,
    /// Effective tax rate applied to the cost of debt
    pub tax_rate: Rate,
    /// Market value of equity; book equity of the latest year is used when absent
    #[serde(default)]
    pub market_capitalization: Option<Money>,
    #[serde(default)]
    pub assumptions: ModelAssumptions,
}

/// Every intermediate result of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfModelOutput {
    pub ratio_profile: RatioProfile,
    /// `None` when the growth rate was overridden
    pub growth: Option<GrowthEstimate>,
    pub growth_rate_used: Rate,
    pub historical_fcf: Vec<HistoricalFreeCashFlow>,
    pub forecast: FcfForecast,
    pub cost_of_debt: CostOfDebtOutput,
    /// `None` when the cost of equity was overridden
    pub capm: Option<CapmOutput>,
    pub wacc: WaccOutput,
    pub valuation: ValuationOutput,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full valuation. Any stage error aborts the run.
pub fn run_dcf_model(input: &DcfModelInput) -> IntrinsicResult<ComputationOutput<DcfModelOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let assumptions = &input.assumptions;
    let history = &input.history;
    let latest = history.latest();

    if input.market_data.is_none() && assumptions.cost_of_equity_override.is_none() {
        return Err(missing_market_data());
    }

    // Ratio profile
    let (ratio_profile, stage) = build_ratio_profile(history, assumptions.ratio_selection)?.into_parts();
    absorb(&mut warnings, "Ratios", stage);

    // Growth
    let (growth, growth_rate_used) = match assumptions.growth_rate_override {
        Some(g) => (None, g),
        None => {
            let (estimate, stage) =
                estimate_growth_rate(history, assumptions.growth_window_years)?.into_parts();
            absorb(&mut warnings, "Growth", stage);
            let rate = estimate.growth_rate;
            (Some(estimate), rate)
        }
    };

    // Forecast
    let forecast_input = ForecastInput::seeded_from(
        latest,
        ratio_profile.clone(),
        growth_rate_used,
        assumptions.forecast_years,
        assumptions.scenario_spread,
    )?;
    let (forecast, stage) = forecast_free_cash_flows(&forecast_input)?.into_parts();
    absorb(&mut warnings, "Forecast", stage);

    // Historical FCF
    let historical_fcf = if history.len() < 2 {
        absorb(
            &mut warnings,
            "FCF",
            vec!["Only one fiscal year supplied; historical FCF table skipped".into()],
        );
        Vec::new()
    } else {
        let (table, stage) = historical_free_cash_flows(history)?.into_parts();
        absorb(&mut warnings, "FCF", stage);
        table
    };

    // Cost of debt
    let (cost_of_debt, stage) = estimate_cost_of_debt(&CostOfDebtInput {
        ebitda: latest.line(StatementLine::Ebitda)?,
        depreciation_and_amortization: latest.line(StatementLine::DepreciationAndAmortization)?,
        interest_expense: latest.line(StatementLine::InterestExpense)?,
        risk_free_rate: input.risk_free_rate,
    })?
    .into_parts();
    absorb(&mut warnings, "Cost of debt", stage);

    // Cost of equity
    let (capm, cost_of_equity) = match assumptions.cost_of_equity_override {
        Some(ke) => (None, ke),
        None => {
            let market = input.market_data.as_ref().ok_or_else(missing_market_data)?;
            let capm_input = capm_input(market, input.risk_free_rate, assumptions.return_frequency)?;
            let (capm, stage) = estimate_cost_of_equity(&capm_input)?.into_parts();
            absorb(&mut warnings, "CAPM", stage);
            let ke = capm.expected_return;
            (Some(capm), ke)
        }
    };

    // WACC
    let total_debt = latest.line(StatementLine::TotalDebt)?;
    let total_equity = match input.market_capitalization {
        Some(cap) => cap,
        None => {
            absorb(
                &mut warnings,
                "WACC",
                vec!["No market capitalisation supplied; weighting by book equity".into()],
            );
            match latest.value(StatementLine::TotalEquity) {
                Some(equity) => equity,
                None => latest.book_value_of_equity()?,
            }
        }
    };
    let (wacc, stage) = calculate_wacc(&WaccInput {
        cost_of_debt: cost_of_debt.cost_of_debt,
        cost_of_equity,
        tax_rate: input.tax_rate,
        total_debt,
        total_equity,
    })?
    .into_parts();
    absorb(&mut warnings, "WACC", stage);

    // Valuation
    let (valuation, stage) = value_forecast(
        &forecast,
        &ValuationInput {
            wacc: wacc.wacc,
            cash_and_equivalents: latest.line(StatementLine::CashAndEquivalents)?,
            total_debt,
            shares_outstanding: latest.line(StatementLine::SharesOutstanding)?,
            perpetuity_growth_rate: assumptions.perpetuity_growth_rate,
        },
    )?
    .into_parts();
    absorb(&mut warnings, "Valuation", stage);

    tracing::debug!(
        base_year = latest.year,
        wacc = %wacc.wacc,
        neutral_price = %valuation.scenarios.neutral.estimated_price_per_share,
        "DCF model complete"
    );

    let output = DcfModelOutput {
        ratio_profile,
        growth,
        growth_rate_used,
        historical_fcf,
        forecast,
        cost_of_debt,
        capm,
        wacc,
        valuation,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions_json = serde_json::json!({
        "base_year": latest.year,
        "risk_free_rate": input.risk_free_rate,
        "tax_rate": input.tax_rate,
        "market_capitalization": input.market_capitalization,
        "assumptions": assumptions,
    });

    Ok(with_metadata(
        "Multi-scenario DCF: ratio-driven FCF forecast, synthetic-rating cost of debt, CAPM cost of equity, WACC discounting",
        &assumptions_json,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn capm_input(
    market: &MarketData,
    risk_free_rate: Rate,
    frequency: ReturnFrequency,
) -> IntrinsicResult<CapmInput> {
    let (company_returns, index_returns) = match market {
        MarketData::Returns {
            company_returns,
            index_returns,
        } => (company_returns.clone(), index_returns.clone()),
        MarketData::Prices {
            company_prices,
            index_prices,
        } => {
            let aligned = align_returns(
                &returns_at_frequency(company_prices, frequency)?,
                &returns_at_frequency(index_prices, frequency)?,
            );
            (aligned.company, aligned.index)
        }
    };
    Ok(CapmInput {
        company_returns,
        index_returns,
        risk_free_rate,
        frequency,
    })
}

fn missing_market_data() -> IntrinsicError {
    IntrinsicError::InvalidParameter {
        field: "market_data".into(),
        reason: "Market data or a cost of equity override is required".into(),
    }
}

fn absorb(warnings: &mut Vec<String>, stage: &str, stage_warnings: Vec<String>) {
    for w in stage_warnings {
        tracing::warn!(stage, "{}", w);
        warnings.push(format!("[{stage}] {w}"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::record::FinancialRecord;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(year: i32, revenue: Decimal) -> FinancialRecord {
        let mut r = FinancialRecord::new(year);
        r.revenue = Some(revenue);
        r.net_income = Some(revenue * dec!(0.10));
        r.depreciation_and_amortization = Some(revenue * dec!(0.05));
        r.property_plant_equipment_net = Some(revenue * dec!(0.03));
        r.inventory = Some(revenue * dec!(0.02));
        r.net_receivables = Some(revenue * dec!(0.01));
        r.account_payables = Some(revenue * dec!(0.01));
        r.ebitda = Some(revenue * dec!(0.20));
        r.interest_expense = Some(revenue * dec!(0.02));
        r.dividends_paid = Some(revenue * dec!(-0.04));
        r.total_assets = Some(revenue * dec!(1.5));
        r.total_liabilities = Some(revenue * dec!(0.9));
        r.total_debt = Some(dec!(200));
        r.cash_and_equivalents = Some(dec!(100));
        r.shares_outstanding = Some(dec!(50));
        r
    }

    fn input() -> DcfModelInput {
        let history = FinancialHistory::new(vec![record(2022, dec!(1000)), record(2023, dec!(1100))]).unwrap();
        DcfModelInput {
            history,
            market_data: None,
            risk_free_rate: dec!(0.04),
            tax_rate: dec!(0.21),
            market_capitalization: Some(dec!(2000)),
            assumptions: ModelAssumptions {
                cost_of_equity_override: Some(dec!(0.09)),
                ..ModelAssumptions::default()
            },
        }
    }

    #[test]
    fn test_defaults() {
        let a = ModelAssumptions::default();
        assert_eq!(a.forecast_years, 5);
        assert_eq!(a.perpetuity_growth_rate, dec!(0.02));
        assert_eq!(a.scenario_spread, dec!(0.05));
        assert_eq!(a.ratio_selection, RatioSelection::All);
        let parsed: ModelAssumptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, a);
    }

    #[test]
    fn test_requires_cost_of_equity_source() {
        let mut i = input();
        i.assumptions.cost_of_equity_override = None;
        assert!(matches!(
            run_dcf_model(&i),
            Err(IntrinsicError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_runs_with_override() {
        let out = run_dcf_model(&input()).unwrap();
        let r = &out.result;
        assert!(r.capm.is_none());
        assert_eq!(r.forecast.rows.len(), 5);
        assert_eq!(r.historical_fcf.len(), 1);
        assert_eq!(r.wacc.cost_of_equity, dec!(0.09));
        assert!(r.valuation.scenarios.positive.estimated_price_per_share
            > r.valuation.scenarios.negative.estimated_price_per_share);
    }

    #[test]
    fn test_stage_warnings_prefixed() {
        let mut i = input();
        i.market_capitalization = None;
        let out = run_dcf_model(&i).unwrap();
        assert!(out.warnings.iter().any(|w| w.starts_with("[WACC] ")));
    }

    #[test]
    fn test_reported_equity_weights_capital() {
        let mut i = input();
        i.market_capitalization = None;
        let mut records = i.history.records().to_vec();
        records[1].total_equity = Some(dec!(800));
        i.history = FinancialHistory::new(records).unwrap();
        let out = run_dcf_model(&i).unwrap();
        // 200 debt, 800 equity
        assert_eq!(out.result.wacc.equity_weight, dec!(0.8));
    }

    #[test]
    fn test_negative_book_equity_still_values() {
        let mut i = input();
        i.market_capitalization = None;
        let mut records = i.history.records().to_vec();
        records[1].total_equity = Some(dec!(-20));
        i.history = FinancialHistory::new(records).unwrap();
        let out = run_dcf_model(&i).unwrap();
        assert!(out.result.wacc.equity_weight < Decimal::ZERO);
        assert!(out.result.wacc.debt_weight > Decimal::ONE);
    }

    #[test]
    fn test_missing_line_aborts() {
        let mut i = input();
        let mut records = i.history.records().to_vec();
        records[1].interest_expense = None;
        i.history = FinancialHistory::new(records).unwrap();
        assert!(matches!(
            run_dcf_model(&i),
            Err(IntrinsicError::MissingData { .. })
        ));
    }
}
