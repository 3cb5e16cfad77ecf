use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use serde::Deserialize;

use crate::data_source::{BarsRequest, DataSource, SourceError, SourceFuture};
use crate::{Bar, BarSeries, EarningsCalendar, InstrumentInfo, ProviderId, Symbol, ValidationError};

/// Canned provider data for one symbol.
///
/// The `*_error` fields make the matching query fail with
/// `SourceError::unavailable`, which is how tests stage provider outages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureInstrument {
    pub info: InstrumentInfo,
    pub bars: Vec<Bar>,
    pub calendar: EarningsCalendar,
    pub info_error: Option<String>,
    pub bars_error: Option<String>,
    pub calendar_error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    instruments: BTreeMap<Symbol, FixtureInstrument>,
}

/// Which provider query a call count refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FixtureQuery {
    Info,
    Bars,
    Calendar,
}

/// In-memory provider serving canned instruments.
///
/// Symbols without an entry answer `SourceError::not_found`, the same way a
/// live provider reports an unknown ticker.
#[derive(Debug, Default)]
pub struct FixtureSource {
    instruments: BTreeMap<Symbol, FixtureInstrument>,
    calls: Mutex<BTreeMap<(Symbol, FixtureQuery), usize>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixtures from JSON shaped as `{ "instruments": { "AAPL": { .. } } }`.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let file: FixtureFile =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidFixture {
                reason: e.to_string(),
            })?;
        Ok(Self {
            instruments: file.instruments,
            ..Self::default()
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ValidationError::InvalidFixture {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_instrument(mut self, symbol: Symbol, instrument: FixtureInstrument) -> Self {
        self.instruments.insert(symbol, instrument);
        self
    }

    /// Number of times `query` was issued for `symbol`.
    pub fn call_count(&self, symbol: &Symbol, query: FixtureQuery) -> usize {
        self.calls
            .lock()
            .expect("fixture call log is not poisoned")
            .get(&(symbol.clone(), query))
            .copied()
            .unwrap_or(0)
    }

    fn lookup(&self, symbol: &Symbol, query: FixtureQuery) -> Result<&FixtureInstrument, SourceError> {
        *self
            .calls
            .lock()
            .expect("fixture call log is not poisoned")
            .entry((symbol.clone(), query))
            .or_insert(0) += 1;

        self.instruments
            .get(symbol)
            .ok_or_else(|| SourceError::not_found(format!("fixture has no instrument '{symbol}'")))
    }
}

fn staged_failure(message: &Option<String>) -> Result<(), SourceError> {
    match message {
        Some(message) => Err(SourceError::unavailable(message.clone())),
        None => Ok(()),
    }
}

impl DataSource for FixtureSource {
    fn id(&self) -> ProviderId {
        ProviderId::Fixture
    }

    fn instrument_info<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, InstrumentInfo> {
        let result = self.lookup(symbol, FixtureQuery::Info).and_then(|entry| {
            staged_failure(&entry.info_error)?;
            Ok(entry.info.clone())
        });
        Box::pin(async move { result })
    }

    fn daily_bars<'a>(&'a self, req: BarsRequest) -> SourceFuture<'a, BarSeries> {
        let result = self.lookup(&req.symbol, FixtureQuery::Bars).and_then(|entry| {
            staged_failure(&entry.bars_error)?;
            Ok(BarSeries::new(req.symbol.clone(), entry.bars.clone()))
        });
        Box::pin(async move { result })
    }

    fn earnings_calendar<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, EarningsCalendar> {
        let result = self
            .lookup(symbol, FixtureQuery::Calendar)
            .and_then(|entry| {
                staged_failure(&entry.calendar_error)?;
                Ok(entry.calendar.clone())
            });
        Box::pin(async move { result })
    }
}
