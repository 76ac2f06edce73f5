pub mod cost_of_capital;
pub mod statements;
pub mod valuation;

use intrinsic_core::statements::record::FinancialHistory;
use serde::Deserialize;

/// Statement input: either a bare list of fiscal-year records or an object
/// carrying them under `history` (the shape the `value` command reads).
#[derive(Deserialize)]
#[serde(untagged)]
pub enum HistoryDocument {
    Records(FinancialHistory),
    Wrapped { history: FinancialHistory },
}

impl HistoryDocument {
    pub fn into_history(self) -> FinancialHistory {
        match self {
            Self::Records(history) | Self::Wrapped { history } => history,
        }
    }
}
