//! Ticker-list validation against a market-data provider.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{DataSource, Symbol};

const DEFAULT_CONCURRENCY: usize = 4;

/// Result of one validation round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// Accepted symbols in input order, duplicates preserved.
    pub valid: Vec<Symbol>,
    /// Trimmed raw candidates the provider could not resolve.
    pub rejected: Vec<String>,
}

impl ValidationOutcome {
    /// True when the round can be accepted as a whole.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty() && !self.valid.is_empty()
    }
}

/// Checks that every entry of a comma-separated ticker list is known to the
/// provider.
///
/// A candidate is valid when its metadata carries a regular market price, a
/// long name or a short name. A round with any rejection must be resubmitted
/// in full; the outcome still reports which candidates resolved.
#[derive(Clone)]
pub struct TickerValidator {
    source: Arc<dyn DataSource>,
    concurrency: usize,
}

impl TickerValidator {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn validate(&self, raw_input: &str) -> ValidationOutcome {
        let candidates: Vec<&str> = split_candidates(raw_input).collect();

        let checks: Vec<(&str, Option<Symbol>)> = stream::iter(candidates)
            .map(|candidate| async move { (candidate, self.resolve(candidate).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut outcome = ValidationOutcome::default();
        for (candidate, resolved) in checks {
            match resolved {
                Some(symbol) => outcome.valid.push(symbol),
                None => outcome.rejected.push(candidate.to_owned()),
            }
        }
        debug!(
            valid = outcome.valid.len(),
            rejected = outcome.rejected.len(),
            "validation round finished"
        );
        outcome
    }

    async fn resolve(&self, candidate: &str) -> Option<Symbol> {
        let symbol = match Symbol::parse(candidate) {
            Ok(symbol) => symbol,
            Err(error) => {
                debug!(candidate, %error, "rejecting blank ticker");
                return None;
            }
        };

        match self.source.instrument_info(&symbol).await {
            Ok(info) if info.is_known() => Some(symbol),
            Ok(_) => {
                debug!(%symbol, "provider returned no price or name");
                None
            }
            Err(error) => {
                warn!(%symbol, code = error.code(), %error, "ticker lookup failed");
                None
            }
        }
    }
}

/// Split on commas and trim; empty pieces are kept so they can be rejected.
pub fn split_candidates(raw_input: &str) -> impl Iterator<Item = &str> {
    raw_input.split(',').map(str::trim)
}
