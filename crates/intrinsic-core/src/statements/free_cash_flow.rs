use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::arith;
use crate::error::IntrinsicError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::IntrinsicResult;

use super::ratios::RatioProfile;
use super::record::{FinancialHistory, FinancialRecord, StatementLine};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Statement lines for a pair of consecutive fiscal years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeCashFlowInput {
    pub net_income: Money,
    pub depreciation_current: Money,
    pub depreciation_previous: Money,
    pub ppe_current: Money,
    pub ppe_previous: Money,
    pub inventory_current: Money,
    pub inventory_previous: Money,
    pub receivables_current: Money,
    pub receivables_previous: Money,
    pub payables_current: Money,
    pub payables_previous: Money,
}

/// FCF together with its working-capital and capex components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeCashFlow {
    pub fcf: Money,
    pub change_in_working_capital: Money,
    pub capex: Money,
}

/// FCF computed from two consecutive reported years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalFreeCashFlow {
    pub year: i32,
    pub fcf: Money,
    pub change_in_working_capital: Money,
    pub capex: Money,
}

impl FreeCashFlowInput {
    /// Read the required lines from two reported years.
    pub fn from_records(current: &FinancialRecord, previous: &FinancialRecord) -> IntrinsicResult<Self> {
        Ok(Self {
            net_income: current.line(StatementLine::NetIncome)?,
            depreciation_current: current.line(StatementLine::DepreciationAndAmortization)?,
            depreciation_previous: previous.line(StatementLine::DepreciationAndAmortization)?,
            ppe_current: current.line(StatementLine::PropertyPlantEquipmentNet)?,
            ppe_previous: previous.line(StatementLine::PropertyPlantEquipmentNet)?,
            inventory_current: current.line(StatementLine::Inventory)?,
            inventory_previous: previous.line(StatementLine::Inventory)?,
            receivables_current: current.line(StatementLine::NetReceivables)?,
            receivables_previous: previous.line(StatementLine::NetReceivables)?,
            payables_current: current.line(StatementLine::AccountPayables)?,
            payables_previous: previous.line(StatementLine::AccountPayables)?,
        })
    }

    /// Rebuild the lines from projected revenue using the ratio profile.
    pub fn from_profile(
        profile: &RatioProfile,
        revenue_current: Money,
        revenue_previous: Money,
    ) -> IntrinsicResult<Self> {
        let cur = |line| profile.apply(line, revenue_current);
        let prev = |line| profile.apply(line, revenue_previous);
        Ok(Self {
            net_income: cur(StatementLine::NetIncome)?,
            depreciation_current: cur(StatementLine::DepreciationAndAmortization)?,
            depreciation_previous: prev(StatementLine::DepreciationAndAmortization)?,
            ppe_current: cur(StatementLine::PropertyPlantEquipmentNet)?,
            ppe_previous: prev(StatementLine::PropertyPlantEquipmentNet)?,
            inventory_current: cur(StatementLine::Inventory)?,
            inventory_previous: prev(StatementLine::Inventory)?,
            receivables_current: cur(StatementLine::NetReceivables)?,
            receivables_previous: prev(StatementLine::NetReceivables)?,
            payables_current: cur(StatementLine::AccountPayables)?,
            payables_previous: prev(StatementLine::AccountPayables)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Free cash flow from statement-line deltas.
///
/// ΔWC   = Δreceivables + Δpayables + Δinventory
/// CapEx = ΔPP&E + D&A_current
/// FCF   = net income + (D&A_current − D&A_previous) − CapEx − ΔWC
pub fn calculate_free_cash_flow(input: &FreeCashFlowInput) -> IntrinsicResult<FreeCashFlow> {
    const CTX: &str = "free cash flow";

    let change_in_working_capital = arith::sum(
        [
            arith::sub(input.receivables_current, input.receivables_previous, CTX)?,
            arith::sub(input.payables_current, input.payables_previous, CTX)?,
            arith::sub(input.inventory_current, input.inventory_previous, CTX)?,
        ],
        CTX,
    )?;

    let capex = arith::add(
        arith::sub(input.ppe_current, input.ppe_previous, CTX)?,
        input.depreciation_current,
        CTX,
    )?;

    let depreciation_change = arith::sub(input.depreciation_current, input.depreciation_previous, CTX)?;
    let fcf = arith::sub(
        arith::sub(arith::add(input.net_income, depreciation_change, CTX)?, capex, CTX)?,
        change_in_working_capital,
        CTX,
    )?;

    Ok(FreeCashFlow {
        fcf,
        change_in_working_capital,
        capex,
    })
}

/// Apply the FCF model to every consecutive pair of reported years.
pub fn historical_free_cash_flows(
    history: &FinancialHistory,
) -> IntrinsicResult<ComputationOutput<Vec<HistoricalFreeCashFlow>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if history.len() < 2 {
        return Err(IntrinsicError::InvalidParameter {
            field: "records".into(),
            reason: "Historical FCF needs at least two consecutive fiscal years".into(),
        });
    }

    let mut table = Vec::with_capacity(history.len() - 1);
    for pair in history.records().windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.year != previous.year + 1 {
            warnings.push(format!(
                "Fiscal years {} and {} are not consecutive; FCF spans the gap",
                previous.year, current.year
            ));
        }
        let flow = calculate_free_cash_flow(&FreeCashFlowInput::from_records(current, previous)?)?;
        table.push(HistoricalFreeCashFlow {
            year: current.year,
            fcf: flow.fcf,
            change_in_working_capital: flow.change_in_working_capital,
            capex: flow.capex,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({ "years": history.years() });
    Ok(with_metadata(
        "FCF = NI + ΔD&A − CapEx − ΔWC on reported statements",
        &assumptions,
        warnings,
        elapsed,
        table,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
