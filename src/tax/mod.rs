pub mod cgt;
pub mod uk;

pub use cgt::{calculate, CapitalGainsEvent, TaxReport};
pub use uk::{TaxRules, TaxYear};
