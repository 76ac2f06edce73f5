pub mod free_cash_flow;
pub mod growth;
pub mod ratios;
pub mod record;
