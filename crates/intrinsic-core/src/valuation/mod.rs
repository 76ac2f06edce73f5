pub mod dcf;

#[cfg(feature = "cost_of_capital")]
pub mod model;
