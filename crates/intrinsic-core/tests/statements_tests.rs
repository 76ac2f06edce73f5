use intrinsic_core::statements::free_cash_flow::{
    calculate_free_cash_flow, historical_free_cash_flows, FreeCashFlowInput,
};
use intrinsic_core::statements::growth::{average_sustainable_growth, estimate_growth_rate};
use intrinsic_core::statements::ratios::{
    build_ratio_profile, ratio_profile_from_records, RatioSelection,
};
use intrinsic_core::statements::record::{FinancialHistory, FinancialRecord, StatementLine};
use intrinsic_core::IntrinsicError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn record(year: i32, revenue: Decimal) -> FinancialRecord {
    FinancialRecord {
        revenue: Some(revenue),
        net_income: Some(revenue * dec!(0.10)),
        depreciation_and_amortization: Some(revenue * dec!(0.05)),
        property_plant_equipment_net: Some(revenue * dec!(0.40)),
        inventory: Some(revenue * dec!(0.12)),
        net_receivables: Some(revenue * dec!(0.09)),
        account_payables: Some(revenue * dec!(0.07)),
        dividends_paid: Some(revenue * dec!(-0.03)),
        total_assets: Some(revenue * dec!(2)),
        total_liabilities: Some(revenue),
        ..FinancialRecord::new(year)
    }
}

// ===========================================================================
// FreeCashFlowModel
// ===========================================================================

#[test]
fn test_flat_balance_sheet_fcf_equals_net_income() {
    let input = FreeCashFlowInput {
        net_income: dec!(87.5),
        depreciation_current: dec!(31),
        depreciation_previous: dec!(31),
        ppe_current: dec!(640),
        ppe_previous: dec!(640),
        inventory_current: dec!(75),
        inventory_previous: dec!(75),
        receivables_current: dec!(52),
        receivables_previous: dec!(52),
        payables_current: dec!(44),
        payables_previous: dec!(44),
    };
    let flow = calculate_free_cash_flow(&input).unwrap();
    assert_eq!(flow.change_in_working_capital, Decimal::ZERO);
    assert_eq!(flow.capex, dec!(31));
    assert_eq!(flow.fcf, dec!(87.5) - dec!(31));
}

#[test]
fn test_historical_fcf_table_skips_first_year() {
    let history = FinancialHistory::new(vec![
        record(2021, dec!(1000)),
        record(2022, dec!(1100)),
        record(2023, dec!(1210)),
    ])
    .unwrap();
    let out = historical_free_cash_flows(&history).unwrap();
    let years: Vec<i32> = out.result.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2022, 2023]);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_historical_fcf_missing_line() {
    let mut previous = record(2022, dec!(1000));
    previous.inventory = None;
    let history = FinancialHistory::new(vec![previous, record(2023, dec!(1100))]).unwrap();
    let err = historical_free_cash_flows(&history).unwrap_err();
    match err {
        IntrinsicError::MissingData { year, line } => {
            assert_eq!(year, Some(2022));
            assert_eq!(line, StatementLine::Inventory);
        }
        other => panic!("expected MissingData, got {other:?}"),
    }
}

// ===========================================================================
// RatioProfileBuilder
// ===========================================================================

#[test]
fn test_all_over_single_year_matches_year_mode() {
    let records = vec![record(2023, dec!(1234.5))];
    let all = ratio_profile_from_records(&records, RatioSelection::All).unwrap();
    let single = ratio_profile_from_records(&records, RatioSelection::Year(2023)).unwrap();
    assert_eq!(all.ratios(), single.ratios());
}

#[test]
fn test_ratio_profile_values() {
    let history = FinancialHistory::new(vec![record(2022, dec!(1000)), record(2023, dec!(1100))]).unwrap();
    let profile = build_ratio_profile(&history, RatioSelection::Year(2023)).unwrap().result;
    assert_eq!(profile.ratio(StatementLine::NetIncome).unwrap(), dec!(0.10));
    assert_eq!(profile.ratio(StatementLine::AccountPayables).unwrap(), dec!(0.07));
    assert_eq!(profile.ratios().len(), StatementLine::RATIO_LINES.len());
}

#[test]
fn test_ratio_profile_zero_revenue() {
    let mut r = record(2023, dec!(1000));
    r.revenue = Some(Decimal::ZERO);
    let history = FinancialHistory::new(vec![r]).unwrap();
    assert!(matches!(
        build_ratio_profile(&history, RatioSelection::All),
        Err(IntrinsicError::DivisionByZero { .. })
    ));
}

#[test]
fn test_ratio_profile_unknown_year() {
    let history = FinancialHistory::new(vec![record(2023, dec!(1000))]).unwrap();
    assert!(matches!(
        build_ratio_profile(&history, RatioSelection::Year(2019)),
        Err(IntrinsicError::InvalidParameter { .. })
    ));
}

// ===========================================================================
// GrowthEstimator
// ===========================================================================

#[test]
fn test_growth_is_retention_times_roe() {
    let history = FinancialHistory::new(vec![record(2022, dec!(1000)), record(2023, dec!(1100))]).unwrap();
    let out = estimate_growth_rate(&history, 5).unwrap();
    // retention 0.7, ROE 0.1 -> 0.07 each year
    assert_eq!(out.result.growth_rate, dec!(0.07));
    assert_eq!(out.result.years.len(), 2);
    assert!(out.warnings.iter().any(|w| w.contains("only 2 available")));
}

#[test]
fn test_dividend_sign_convention_is_irrelevant() {
    let negative = average_sustainable_growth(&[dec!(-30)], &[dec!(100)], &[dec!(1000)]).unwrap();
    let positive = average_sustainable_growth(&[dec!(30)], &[dec!(100)], &[dec!(1000)]).unwrap();
    assert_eq!(negative, positive);
}

#[test]
fn test_growth_zero_net_income() {
    let result = average_sustainable_growth(&[dec!(10)], &[Decimal::ZERO], &[dec!(1000)]);
    assert!(matches!(result, Err(IntrinsicError::DivisionByZero { .. })));
}

// ===========================================================================
// Provider payloads
// ===========================================================================

#[test]
fn test_history_from_provider_json() {
    let json = r#"[
        {"calendarYear": "2023", "revenue": 1100, "netIncome": 110, "dividendsPaid": -33},
        {"calendarYear": "2022", "revenue": 1000, "netIncome": 100, "dividendsPaid": -30}
    ]"#;
    let history: FinancialHistory = serde_json::from_str(json).unwrap();
    assert_eq!(history.years(), vec![2022, 2023]);
    assert_eq!(history.latest().net_income, Some(dec!(110)));
    assert_eq!(history.record(2022).and_then(|r| r.dividends_paid), Some(dec!(-30)));
}

#[test]
fn test_history_rejects_duplicate_years() {
    let json = r#"[{"year": 2023, "revenue": 1}, {"year": 2023, "revenue": 2}]"#;
    assert!(serde_json::from_str::<FinancialHistory>(json).is_err());
}
