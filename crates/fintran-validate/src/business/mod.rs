//! Business-rule validators.
//!
//! These enforce domain semantics and report violations as errors. A missing
//! required column fails the result immediately without inspecting rows.

mod amounts;
mod currency;
mod dates;

pub use amounts::{PositiveAmountsConfig, PositiveAmountsValidator};
pub use currency::{CurrencyConsistencyConfig, CurrencyConsistencyValidator};
pub use dates::{DateRangeConfig, DateRangeValidator};
