//! sigtrader: feature enrichment, signal scoring, and single-position backtesting
//! for 15-minute BTC bars.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod worker;
