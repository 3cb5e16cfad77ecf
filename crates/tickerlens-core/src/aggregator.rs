//! Per-ticker metric aggregation.
//!
//! For each ticker the aggregator issues three provider queries and folds
//! them into a [`FinancialRecord`]:
//!
//! | Metric | Source |
//! |--------|--------|
//! | Current price | Latest daily close, else metadata market price |
//! | Volume, market cap, beta, P/E, EPS | Metadata |
//! | Next earnings date | Earnings calendar, earliest date after today |
//! | P/B ratio | Current price / metadata book value |
//!
//! Metadata is required for a record. History and calendar failures only
//! cost the metrics that depend on them.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use time::Date;
use tracing::{debug, info, warn};

use crate::data_source::BarsRequest;
use crate::earnings::next_earnings_date;
use crate::report::{FinancialRecord, PortfolioReport, ReportEntry, TickerFailure};
use crate::{
    local_today, AggregateError, DataSource, EarningsCalendar, SourceError, Symbol,
    ValidationError,
};

/// What to do when a ticker's metadata lookup fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop and return the error; no report is produced.
    #[default]
    Abort,
    /// Leave the ticker out and list it in [`PortfolioReport::failures`].
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Tickers fetched at once. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Calendar days of daily history used to find the latest close.
    pub price_lookback_days: u16,
    pub failure_policy: FailurePolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            price_lookback_days: 5,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// Builds a [`PortfolioReport`] from a provider.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn DataSource>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(source: Arc<dyn DataSource>, config: AggregatorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate against today's local calendar date.
    pub async fn aggregate(&self, tickers: &[Symbol]) -> Result<PortfolioReport, AggregateError> {
        self.aggregate_as_of(tickers, local_today()).await
    }

    /// Aggregate with `today` as the reference date for upcoming earnings.
    ///
    /// Output order matches `tickers`, duplicates included.
    pub async fn aggregate_as_of(
        &self,
        tickers: &[Symbol],
        today: Date,
    ) -> Result<PortfolioReport, AggregateError> {
        if self.config.price_lookback_days == 0 {
            return Err(ValidationError::EmptyLookback.into());
        }

        info!(
            provider = %self.source.id(),
            tickers = tickers.len(),
            as_of = %today,
            "aggregating portfolio"
        );

        let results: Vec<(&Symbol, Result<FinancialRecord, SourceError>)> =
            stream::iter(tickers)
                .map(|symbol| async move { (symbol, self.build_record(symbol, today).await) })
                .buffered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut report = PortfolioReport {
            as_of: today,
            records: Vec::with_capacity(results.len()),
            failures: Vec::new(),
        };
        for (symbol, result) in results {
            match result {
                Ok(record) => report.records.push(ReportEntry {
                    ticker: symbol.clone(),
                    record,
                }),
                Err(source) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        return Err(AggregateError::Provider {
                            symbol: symbol.clone(),
                            source,
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!(%symbol, code = source.code(), %source, "skipping ticker");
                        report.failures.push(TickerFailure::new(symbol.clone(), &source));
                    }
                },
            }
        }
        Ok(report)
    }

    async fn build_record(&self, symbol: &Symbol, today: Date) -> Result<FinancialRecord, SourceError> {
        let request = BarsRequest::new(symbol.clone(), self.config.price_lookback_days)?;
        let (info, bars, calendar) = futures::join!(
            self.source.instrument_info(symbol),
            self.source.daily_bars(request),
            self.source.earnings_calendar(symbol),
        );
        let info = info?;

        let latest_close = match bars {
            Ok(series) => series.latest_close(),
            Err(error) => {
                warn!(%symbol, %error, "price history unavailable; using market price");
                None
            }
        };
        let current_price = latest_close.or(info.regular_market_price);

        let calendar = calendar.unwrap_or_else(|error| {
            warn!(%symbol, %error, "earnings calendar unavailable");
            EarningsCalendar::NoEarningsData
        });

        let record = FinancialRecord {
            current_price,
            volume: info.volume,
            market_cap: info.market_cap,
            beta: info.beta,
            trailing_pe: info.trailing_pe,
            trailing_eps: info.trailing_eps,
            next_earnings_date: next_earnings_date(&calendar, today),
            price_to_book: current_price.and_then(|price| price_to_book(price, info.book_value?)),
        };
        debug!(%symbol, ?record, "record assembled");
        Ok(record)
    }
}

/// Price divided by book value per share; `None` for a zero book value or
/// a non-finite quotient.
pub fn price_to_book(price: f64, book_value: f64) -> Option<f64> {
    if book_value == 0.0 {
        return None;
    }
    Some(price / book_value).filter(|ratio| ratio.is_finite())
}
