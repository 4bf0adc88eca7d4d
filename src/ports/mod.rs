//! Port traits at the engine's boundaries.

pub mod config_port;
pub mod data_port;
pub mod notify_port;
pub mod report_port;
