use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::IntrinsicResult;

use super::record::{FinancialHistory, FinancialRecord, StatementLine};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which historical years feed the ratio profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioSelection {
    /// Mean line value over mean revenue across every supplied year
    #[default]
    All,
    /// Line value over revenue for one fiscal year
    Year(i32),
}

impl FromStr for RatioSelection {
    type Err = IntrinsicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<i32>()
            .map(Self::Year)
            .map_err(|_| IntrinsicError::InvalidParameter {
                field: "ratio_selection".into(),
                reason: format!("Expected 'all' or a fiscal year, got '{s}'"),
            })
    }
}

impl std::fmt::Display for RatioSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Year(y) => write!(f, "{y}"),
        }
    }
}

/// Statement-line-to-revenue ratios used to rebuild line items from projected revenue.
///
/// Ratios are stateless across forecast years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioProfile {
    pub selection: RatioSelection,
    ratios: BTreeMap<StatementLine, Rate>,
}

impl RatioProfile {
    /// Wrap externally supplied ratios. Completeness is checked on lookup.
    pub fn from_ratios(selection: RatioSelection, ratios: BTreeMap<StatementLine, Rate>) -> Self {
        Self { selection, ratios }
    }

    pub fn ratios(&self) -> &BTreeMap<StatementLine, Rate> {
        &self.ratios
    }

    pub fn ratio(&self, line: StatementLine) -> IntrinsicResult<Rate> {
        self.ratios
            .get(&line)
            .copied()
            .ok_or(IntrinsicError::MissingData { year: None, line })
    }

    /// Absolute line value implied by `revenue`.
    pub fn apply(&self, line: StatementLine, revenue: Money) -> IntrinsicResult<Money> {
        arith::mul(self.ratio(line)?, revenue, "ratio applied to revenue")
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the ratio profile from a validated history.
pub fn build_ratio_profile(
    history: &FinancialHistory,
    selection: RatioSelection,
) -> IntrinsicResult<ComputationOutput<RatioProfile>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let profile = ratio_profile_from_records(history.records(), selection)?;

    if let RatioSelection::Year(y) = selection {
        let latest = history.latest().year;
        if y != latest {
            warnings.push(format!(
                "Ratios taken from fiscal year {y}; latest available year is {latest}"
            ));
        }
    }
    if profile.ratio(StatementLine::NetIncome)? < Decimal::ZERO {
        warnings.push("Net income ratio is negative; forecast FCF will start from a loss".into());
    }

    tracing::debug!(selection = %selection, lines = profile.ratios.len(), "ratio profile built");

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({ "selection": selection, "years": history.years() });
    Ok(with_metadata(
        "Statement lines as a ratio of revenue",
        &assumptions,
        warnings,
        elapsed,
        profile,
    ))
}

/// Build the ratio profile from raw records.
///
/// `All` divides the mean of each line by the mean revenue across `records`;
/// `Year(y)` uses the single record for `y`.
pub fn ratio_profile_from_records(
    records: &[FinancialRecord],
    selection: RatioSelection,
) -> IntrinsicResult<RatioProfile> {
    match selection {
        RatioSelection::All => mean_ratios(records),
        RatioSelection::Year(year) => {
            let record = records.iter().find(|r| r.year == year).ok_or_else(|| {
                IntrinsicError::InvalidParameter {
                    field: "ratio_selection".into(),
                    reason: format!("No record for fiscal year {year}"),
                }
            })?;
            ratio_profile_for_record(record)
        }
    }
}

/// Ratios of a single fiscal year.
pub fn ratio_profile_for_record(record: &FinancialRecord) -> IntrinsicResult<RatioProfile> {
    let revenue = record.line(StatementLine::Revenue)?;
    let context = format!("ratio to revenue for fiscal year {}", record.year);

    let mut ratios = BTreeMap::new();
    for line in StatementLine::RATIO_LINES {
        let value = record.line(line)?;
        ratios.insert(line, arith::safe_divide(value, revenue, &context)?);
    }

    Ok(RatioProfile {
        selection: RatioSelection::Year(record.year),
        ratios,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn mean_ratios(records: &[FinancialRecord]) -> IntrinsicResult<RatioProfile> {
    if records.is_empty() {
        return Err(IntrinsicError::InvalidParameter {
            field: "records".into(),
            reason: "At least one fiscal-year record is required".into(),
        });
    }

    let mean_revenue = mean_line(records, StatementLine::Revenue)?;

    let mut ratios = BTreeMap::new();
    for line in StatementLine::RATIO_LINES {
        let mean_value = mean_line(records, line)?;
        ratios.insert(
            line,
            arith::safe_divide(mean_value, mean_revenue, "mean ratio to mean revenue")?,
        );
    }

    Ok(RatioProfile {
        selection: RatioSelection::All,
        ratios,
    })
}

fn mean_line(records: &[FinancialRecord], line: StatementLine) -> IntrinsicResult<Money> {
    let values = records
        .iter()
        .map(|r| r.line(line))
        .collect::<IntrinsicResult<Vec<_>>>()?;
    arith::mean(&values, "mean statement line")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(year: i32, revenue: Decimal) -> FinancialRecord {
        FinancialRecord {
            revenue: Some(revenue),
            net_income: Some(revenue * dec!(0.10)),
            depreciation_and_amortization: Some(revenue * dec!(0.05)),
            property_plant_equipment_net: Some(revenue * dec!(0.40)),
            inventory: Some(revenue * dec!(0.08)),
            net_receivables: Some(revenue * dec!(0.12)),
            account_payables: Some(revenue * dec!(0.06)),
            ..FinancialRecord::new(year)
        }
    }

    #[test]
    fn test_single_year_ratios() {
        let profile = ratio_profile_for_record(&record(2021, dec!(1000))).unwrap();
        assert_eq!(profile.selection, RatioSelection::Year(2021));
        assert_eq!(profile.ratio(StatementLine::NetIncome).unwrap(), dec!(0.10));
        assert_eq!(
            profile.ratio(StatementLine::PropertyPlantEquipmentNet).unwrap(),
            dec!(0.40)
        );
        assert_eq!(profile.ratios().len(), 6);
    }

    #[test]
    fn test_all_uses_mean_over_mean() {
        let mut r1 = record(2020, dec!(100));
        r1.net_income = Some(dec!(10));
        let mut r2 = record(2021, dec!(300));
        r2.net_income = Some(dec!(50));
        let profile = ratio_profile_from_records(&[r1, r2], RatioSelection::All).unwrap();
        // mean NI 30 / mean revenue 200
        assert_eq!(profile.ratio(StatementLine::NetIncome).unwrap(), dec!(0.15));
    }

    #[test]
    fn test_zero_revenue_is_division_error() {
        let r = record(2021, Decimal::ZERO);
        let err = ratio_profile_for_record(&r).unwrap_err();
        assert!(matches!(err, IntrinsicError::DivisionByZero { .. }));
    }

    #[test]
    fn test_missing_line_is_error() {
        let mut r = record(2021, dec!(500));
        r.account_payables = None;
        let err = ratio_profile_from_records(&[r], RatioSelection::All).unwrap_err();
        assert!(matches!(
            err,
            IntrinsicError::MissingData {
                line: StatementLine::AccountPayables,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_year_rejected() {
        let err = ratio_profile_from_records(&[record(2021, dec!(10))], RatioSelection::Year(2019))
            .unwrap_err();
        assert!(matches!(err, IntrinsicError::InvalidParameter { .. }));
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!("all".parse::<RatioSelection>().unwrap(), RatioSelection::All);
        assert_eq!("2020".parse::<RatioSelection>().unwrap(), RatioSelection::Year(2020));
        assert!("latest".parse::<RatioSelection>().is_err());
    }

    #[test]
    fn test_profile_lookup_miss() {
        let profile = RatioProfile::from_ratios(RatioSelection::All, BTreeMap::new());
        assert!(matches!(
            profile.ratio(StatementLine::Inventory),
            Err(IntrinsicError::MissingData { year: None, .. })
        ));
    }

    #[test]
    fn test_old_year_selection_warns() {
        let history =
            FinancialHistory::new(vec![record(2020, dec!(100)), record(2021, dec!(110))]).unwrap();
        let out = build_ratio_profile(&history, RatioSelection::Year(2020)).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("latest available year")));
    }
}
