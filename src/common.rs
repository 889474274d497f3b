//! Types shared across handlers and services
pub mod date_range;

pub use date_range::{DateRange, Period, PeriodQuery};
