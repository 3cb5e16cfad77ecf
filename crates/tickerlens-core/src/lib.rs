//! # Tickerlens Core
//!
//! Ticker validation and descriptive financial metrics for a small
//! portfolio.
//!
//! ## Overview
//!
//! - **Validator** checks a comma-separated ticker list against a provider
//!   and reports which entries could not be resolved
//! - **Aggregator** builds one [`FinancialRecord`] per ticker: price, volume,
//!   market cap, beta, trailing P/E and EPS, next earnings date, P/B ratio
//! - **Data source trait** decouples both from the market-data provider
//! - **Yahoo adapter** with cookie/crumb auth, retries and a circuit breaker
//! - **Fixture adapter** serving canned data for tests and offline runs
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo, fixture) |
//! | [`aggregator`] | Per-ticker record assembly |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`data_source`] | Provider trait and request/error types |
//! | [`domain`] | Symbols, dates, instrument metadata, bars |
//! | [`earnings`] | Earnings-calendar normalization |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`report`] | Financial records and the portfolio report |
//! | [`retry`] | Retry policy and backoff |
//! | [`source`] | Provider identifiers |
//! | [`validator`] | Ticker-list validation |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickerlens_core::{
//!     Aggregator, AggregatorConfig, ReqwestHttpClient, TickerValidator, YahooAdapter, YahooConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Arc::new(ReqwestHttpClient::new()?);
//!     let source = Arc::new(YahooAdapter::new(http, YahooConfig::default()));
//!
//!     let outcome = TickerValidator::new(source.clone()).validate("AAPL,MSFT").await;
//!     if !outcome.is_complete() {
//!         eprintln!("not found: {}", outcome.rejected.join(", "));
//!         return Ok(());
//!     }
//!
//!     let report = Aggregator::new(source, AggregatorConfig::default())
//!         .aggregate(&outcome.valid)
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod aggregator;
pub mod circuit_breaker;
pub mod data_source;
pub mod domain;
pub mod earnings;
pub mod error;
pub mod http_client;
pub mod report;
pub mod retry;
pub mod source;
pub mod validator;

pub use adapters::{FixtureInstrument, FixtureQuery, FixtureSource, YahooAdapter, YahooConfig};
pub use aggregator::{price_to_book, Aggregator, AggregatorConfig, FailurePolicy};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use data_source::{BarsRequest, DataSource, SourceError, SourceErrorKind, SourceFuture};
pub use domain::{
    date_from_unix, date_from_unix_at, format_date, local_offset, local_today, parse_date, Bar,
    BarSeries, InstrumentInfo, Symbol,
};
pub use earnings::{next_earnings_date, EarningsCalendar};
pub use error::{AggregateError, ValidationError};
pub use http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use report::{FinancialRecord, PortfolioReport, ReportEntry, TickerFailure};
pub use retry::{Backoff, RetryPolicy};
pub use source::ProviderId;
pub use validator::{TickerValidator, ValidationOutcome};
