//! Single-ticker swing-trading simulator.
//!
//! Historical OHLCV ticks are replayed one at a time. An order entered before a tick
//! advance is filled at the open of the following tick, and the account is valued at
//! that tick's close. All data reads go through the point-in-time accessor on
//! [`data::TimeSeriesStore`], which never returns a row dated after the caller's
//! `as_of` date.

pub mod calendar;
pub mod data;
pub mod engine;
pub mod error;
pub mod features;
pub mod metrics;
pub mod pnl;
pub mod portfolio;
pub mod report;
pub mod strategy;
pub mod types;

#[cfg(test)]
mod test_support;

pub use engine::simulator;
pub use error::{Result, SimError};

pub fn engine_name() -> &'static str {
    "swingtrade"
}
