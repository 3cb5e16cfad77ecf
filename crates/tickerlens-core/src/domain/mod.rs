//! # Domain Models
//!
//! Canonical domain types shared by the validator, the aggregator and the
//! provider adapters.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Normalized ticker symbol |
//! | [`InstrumentInfo`] | Provider metadata snapshot (price, names, fundamentals) |
//! | [`Bar`] | Daily OHLCV bar |
//! | [`BarSeries`] | Short window of daily bars for one symbol |

mod date;
mod models;
mod symbol;

pub use date::{
    date_from_unix, date_from_unix_at, format_date, iso_date, local_offset, local_today, parse_date,
};
pub use models::{Bar, BarSeries, InstrumentInfo};
pub use symbol::Symbol;
