use thiserror::Error;

use crate::statements::record::StatementLine;

#[derive(Debug, Error)]
pub enum IntrinsicError {
    #[error("Missing data: {line} {}", missing_scope(.year))]
    MissingData {
        year: Option<i32>,
        line: StatementLine,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Non-finite result in {context}")]
    NonFiniteResult { context: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for IntrinsicError {
    fn from(e: serde_json::Error) -> Self {
        IntrinsicError::Serialization(e.to_string())
    }
}

fn missing_scope(year: &Option<i32>) -> String {
    match year {
        Some(y) => format!("for fiscal year {y}"),
        None => "in ratio profile".to_string(),
    }
}
