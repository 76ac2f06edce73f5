mod arith;
pub mod error;
pub mod statements;
pub mod time_value;
pub mod types;

pub mod forecast;

#[cfg(feature = "cost_of_capital")]
pub mod cost_of_capital;

#[cfg(feature = "valuation")]
pub mod valuation;

pub use error::IntrinsicError;
pub use types::*;

/// Standard result type for all valuation operations
pub type IntrinsicResult<T> = Result<T, IntrinsicError>;
