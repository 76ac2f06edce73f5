pub mod capm;
pub mod returns;
pub mod synthetic_rating;
pub mod wacc;
