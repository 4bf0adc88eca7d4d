//! Core domain types and logic.

pub mod bar;
pub mod indicator;
pub mod enrichment;
pub mod policy;
pub mod signal;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod live;
pub mod config_validation;
pub mod error;
