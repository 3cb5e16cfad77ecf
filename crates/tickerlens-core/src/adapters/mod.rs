//! Provider adapters implementing [`crate::DataSource`].

pub mod fixture;
pub mod yahoo;

pub use fixture::{FixtureInstrument, FixtureQuery, FixtureSource};
pub use yahoo::{YahooAdapter, YahooConfig};
