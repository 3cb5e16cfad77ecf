//! Market-data provider contract and request/error types.
//!
//! The validator and the aggregator only ever talk to a [`DataSource`]. Any
//! provider that can answer the three queries below is substitutable: the
//! live Yahoo adapter, the in-memory fixture adapter, or a test double.
//!
//! | Query | Request | Response |
//! |-------|---------|----------|
//! | Instrument metadata | [`Symbol`] | [`InstrumentInfo`] |
//! | Daily history | [`BarsRequest`] | [`BarSeries`] |
//! | Earnings calendar | [`Symbol`] | [`EarningsCalendar`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{BarSeries, EarningsCalendar, InstrumentInfo, ProviderId, Symbol, ValidationError};

/// Boxed future returned by provider queries.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    NotFound,
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::internal(error.to_string())
    }
}

/// Request payload for the daily history query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsRequest {
    pub symbol: Symbol,
    /// Calendar days of history to cover, ending today.
    pub lookback_days: u16,
}

impl BarsRequest {
    pub fn new(symbol: Symbol, lookback_days: u16) -> Result<Self, ValidationError> {
        if lookback_days == 0 {
            return Err(ValidationError::EmptyLookback);
        }
        Ok(Self {
            symbol,
            lookback_days,
        })
    }
}

/// Market-data provider contract.
///
/// Implementations must be `Send + Sync`; the aggregator shares one source
/// across concurrently running per-ticker lookups.
pub trait DataSource: Send + Sync {
    /// Returns the provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetches instrument metadata: price, display names and fundamentals.
    ///
    /// # Errors
    ///
    /// Returns [`SourceErrorKind::NotFound`] when the provider has no such
    /// instrument, or a transport/parse error otherwise.
    fn instrument_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, InstrumentInfo>;

    /// Fetches recent daily bars, oldest first.
    fn daily_bars<'a>(&'a self, req: BarsRequest) -> SourceFuture<'a, BarSeries>;

    /// Fetches the upcoming earnings calendar.
    ///
    /// Instruments without earnings (funds, indices) should answer
    /// [`EarningsCalendar::NoEarningsData`] rather than an error.
    fn earnings_calendar<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, EarningsCalendar>;
}
