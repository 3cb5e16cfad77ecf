//! Per-ticker financial records and the portfolio report that carries them.

use serde::Serialize;
use time::Date;

use crate::domain::iso_date;
use crate::{SourceError, Symbol};

/// Descriptive metrics for one ticker.
///
/// Each field is independently optional; one missing metric never hides
/// another. Keys serialize with their display labels and absent values as
/// `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialRecord {
    #[serde(rename = "Current Price")]
    pub current_price: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: Option<u64>,
    #[serde(rename = "Market Cap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "Beta (5Y Monthly)")]
    pub beta: Option<f64>,
    #[serde(rename = "PE Ratio (TTM)")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "EPS (TTM)")]
    pub trailing_eps: Option<f64>,
    #[serde(rename = "Next Earning Call Date", with = "iso_date::option")]
    pub next_earnings_date: Option<Date>,
    #[serde(rename = "P/B Ratio")]
    pub price_to_book: Option<f64>,
}

/// One report row: the requested ticker and its record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub ticker: Symbol,
    #[serde(flatten)]
    pub record: FinancialRecord,
}

/// A ticker left out of the report because its metadata lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerFailure {
    pub ticker: Symbol,
    pub code: &'static str,
    pub message: String,
}

impl TickerFailure {
    pub fn new(ticker: Symbol, error: &SourceError) -> Self {
        Self {
            ticker,
            code: error.code(),
            message: error.message().to_owned(),
        }
    }
}

/// Aggregation result, one entry per requested ticker in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioReport {
    /// Calendar date earnings dates were compared against.
    #[serde(with = "iso_date")]
    pub as_of: Date,
    pub records: Vec<ReportEntry>,
    pub failures: Vec<TickerFailure>,
}

impl PortfolioReport {
    pub fn tickers(&self) -> impl Iterator<Item = &Symbol> {
        self.records.iter().map(|entry| &entry.ticker)
    }

    /// First record for `ticker`.
    pub fn record(&self, ticker: &Symbol) -> Option<&FinancialRecord> {
        self.records
            .iter()
            .find(|entry| &entry.ticker == ticker)
            .map(|entry| &entry.record)
    }
}
