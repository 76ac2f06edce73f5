use serde::{Deserialize, Deserializer, Serialize};

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::Money;
use crate::IntrinsicResult;

// ---------------------------------------------------------------------------
// Statement lines
// ---------------------------------------------------------------------------

/// The fixed set of statement lines the valuation engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementLine {
    Revenue,
    NetIncome,
    DepreciationAndAmortization,
    PropertyPlantEquipmentNet,
    Inventory,
    NetReceivables,
    AccountPayables,
    TotalDebt,
    CashAndEquivalents,
    SharesOutstanding,
    Ebitda,
    InterestExpense,
    DividendsPaid,
    TotalEquity,
    TotalAssets,
    TotalLiabilities,
}

impl StatementLine {
    /// Lines carried in a ratio profile, each expressed as a fraction of revenue.
    pub const RATIO_LINES: [StatementLine; 6] = [
        StatementLine::NetIncome,
        StatementLine::DepreciationAndAmortization,
        StatementLine::Inventory,
        StatementLine::PropertyPlantEquipmentNet,
        StatementLine::NetReceivables,
        StatementLine::AccountPayables,
    ];
}

impl std::fmt::Display for StatementLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Revenue => "revenue",
            Self::NetIncome => "netIncome",
            Self::DepreciationAndAmortization => "depreciationAndAmortization",
            Self::PropertyPlantEquipmentNet => "propertyPlantEquipmentNet",
            Self::Inventory => "inventory",
            Self::NetReceivables => "netReceivables",
            Self::AccountPayables => "accountPayables",
            Self::TotalDebt => "totalDebt",
            Self::CashAndEquivalents => "cashAndEquivalents",
            Self::SharesOutstanding => "sharesOutstanding",
            Self::Ebitda => "ebitda",
            Self::InterestExpense => "interestExpense",
            Self::DividendsPaid => "dividendsPaid",
            Self::TotalEquity => "totalStockholdersEquity",
            Self::TotalAssets => "totalAssets",
            Self::TotalLiabilities => "totalLiabilities",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Financial record
// ---------------------------------------------------------------------------

/// One fiscal year of statement data.
///
/// Lines are optional because providers omit fields; reading an absent line
/// through [`FinancialRecord::line`] is a `MissingData` error, never a zero.
/// Both snake_case and the provider's camelCase field names are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    #[serde(alias = "calendarYear", deserialize_with = "year_from_number_or_string")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Money>,
    #[serde(default, alias = "netIncome", skip_serializing_if = "Option::is_none")]
    pub net_income: Option<Money>,
    #[serde(
        default,
        alias = "depreciationAndAmortization",
        skip_serializing_if = "Option::is_none"
    )]
    pub depreciation_and_amortization: Option<Money>,
    #[serde(
        default,
        alias = "propertyPlantEquipmentNet",
        skip_serializing_if = "Option::is_none"
    )]
    pub property_plant_equipment_net: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Money>,
    #[serde(default, alias = "netReceivables", skip_serializing_if = "Option::is_none")]
    pub net_receivables: Option<Money>,
    #[serde(default, alias = "accountPayables", skip_serializing_if = "Option::is_none")]
    pub account_payables: Option<Money>,
    #[serde(default, alias = "totalDebt", skip_serializing_if = "Option::is_none")]
    pub total_debt: Option<Money>,
    #[serde(
        default,
        alias = "cashAndCashEquivalents",
        skip_serializing_if = "Option::is_none"
    )]
    pub cash_and_equivalents: Option<Money>,
    #[serde(default, alias = "numberOfShares", skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebitda: Option<Money>,
    #[serde(default, alias = "interestExpense", skip_serializing_if = "Option::is_none")]
    pub interest_expense: Option<Money>,
    /// As reported; cash-flow statements usually carry this as a negative outflow.
    #[serde(default, alias = "dividendsPaid", skip_serializing_if = "Option::is_none")]
    pub dividends_paid: Option<Money>,
    #[serde(
        default,
        alias = "totalStockholdersEquity",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_equity: Option<Money>,
    #[serde(default, alias = "totalAssets", skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<Money>,
    #[serde(default, alias = "totalLiabilities", skip_serializing_if = "Option::is_none")]
    pub total_liabilities: Option<Money>,
}

impl FinancialRecord {
    /// An empty record for `year`; fill lines with struct update syntax.
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    /// Raw lookup; `None` when the provider did not supply the line.
    pub fn value(&self, line: StatementLine) -> Option<Money> {
        match line {
            StatementLine::Revenue => self.revenue,
            StatementLine::NetIncome => self.net_income,
            StatementLine::DepreciationAndAmortization => self.depreciation_and_amortization,
            StatementLine::PropertyPlantEquipmentNet => self.property_plant_equipment_net,
            StatementLine::Inventory => self.inventory,
            StatementLine::NetReceivables => self.net_receivables,
            StatementLine::AccountPayables => self.account_payables,
            StatementLine::TotalDebt => self.total_debt,
            StatementLine::CashAndEquivalents => self.cash_and_equivalents,
            StatementLine::SharesOutstanding => self.shares_outstanding,
            StatementLine::Ebitda => self.ebitda,
            StatementLine::InterestExpense => self.interest_expense,
            StatementLine::DividendsPaid => self.dividends_paid,
            StatementLine::TotalEquity => self.total_equity,
            StatementLine::TotalAssets => self.total_assets,
            StatementLine::TotalLiabilities => self.total_liabilities,
        }
    }

    /// Required lookup: an absent line is a hard error.
    pub fn line(&self, line: StatementLine) -> IntrinsicResult<Money> {
        self.value(line).ok_or(IntrinsicError::MissingData {
            year: Some(self.year),
            line,
        })
    }

    /// Book value of equity = total assets − total liabilities.
    pub fn book_value_of_equity(&self) -> IntrinsicResult<Money> {
        arith::sub(
            self.line(StatementLine::TotalAssets)?,
            self.line(StatementLine::TotalLiabilities)?,
            "book value of equity",
        )
    }
}

/// Providers send the calendar year as either `2021` or `"2021"`.
fn year_from_number_or_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        Number(i32),
        Text(String),
    }

    match RawYear::deserialize(deserializer)? {
        RawYear::Number(y) => Ok(y),
        RawYear::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Chronologically ordered, non-empty set of fiscal-year records with unique years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FinancialRecord>", into = "Vec<FinancialRecord>")]
pub struct FinancialHistory {
    records: Vec<FinancialRecord>,
}

impl FinancialHistory {
    /// Sorts by year (providers usually return newest first) and rejects
    /// empty input and duplicate years.
    pub fn new(mut records: Vec<FinancialRecord>) -> IntrinsicResult<Self> {
        if records.is_empty() {
            return Err(IntrinsicError::InvalidParameter {
                field: "records".into(),
                reason: "At least one fiscal-year record is required".into(),
            });
        }
        records.sort_by_key(|r| r.year);
        if let Some(pair) = records.windows(2).find(|w| w[0].year == w[1].year) {
            return Err(IntrinsicError::InvalidParameter {
                field: "records".into(),
                reason: format!("Duplicate record for fiscal year {}", pair[0].year),
            });
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[FinancialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent fiscal year.
    pub fn latest(&self) -> &FinancialRecord {
        // non-empty by construction
        &self.records[self.records.len() - 1]
    }

    pub fn record(&self, year: i32) -> Option<&FinancialRecord> {
        self.records.iter().find(|r| r.year == year)
    }

    /// The last `n` years (all of them when fewer are available).
    pub fn most_recent(&self, n: usize) -> &[FinancialRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }
}

impl TryFrom<Vec<FinancialRecord>> for FinancialHistory {
    type Error = IntrinsicError;

    fn try_from(records: Vec<FinancialRecord>) -> Result<Self, Self::Error> {
        Self::new(records)
    }
}

impl From<FinancialHistory> for Vec<FinancialRecord> {
    fn from(history: FinancialHistory) -> Self {
        history.records
    }
}
