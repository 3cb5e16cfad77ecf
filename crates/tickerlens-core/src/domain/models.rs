use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::date::iso_date;
use crate::{Symbol, ValidationError};

/// Provider metadata snapshot for one instrument.
///
/// Every field is independently optional; providers routinely omit some of
/// them (funds have no P/E, fresh listings have no beta).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentInfo {
    pub regular_market_price: Option<f64>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub book_value: Option<f64>,
}

impl InstrumentInfo {
    /// True when the provider knows the instrument: it reports a regular
    /// market price or at least one display name.
    pub fn is_known(&self) -> bool {
        self.regular_market_price.is_some()
            || self.long_name.is_some()
            || self.short_name.is_some()
    }

    /// Best available display name, long name first.
    pub fn display_name(&self) -> Option<&str> {
        self.long_name.as_deref().or(self.short_name.as_deref())
    }
}

/// Daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl Bar {
    pub fn new(
        date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Daily bars for one symbol, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: Symbol, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        Self { symbol, bars }
    }

    /// Close of the most recent trading day in the window.
    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
